//! Line-oriented terminal I/O shared by the shell loop and save prompts.

use scribe::SaveDecider;
use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::rc::Rc;

/// Cheap to clone; every clone reads from and writes to the same streams, so
/// a save prompt raised mid-command consumes the next input line.
#[derive(Clone)]
pub struct Console {
    input: Rc<RefCell<Box<dyn BufRead>>>,
    output: Rc<RefCell<Box<dyn Write>>>,
}

impl Console {
    pub fn new(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        Self {
            input: Rc::new(RefCell::new(input)),
            output: Rc::new(RefCell::new(output)),
        }
    }

    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdin().lock()), Box::new(io::stdout()))
    }

    /// Prints `prompt` and reads one line without its terminator. `None` at
    /// end of input.
    pub fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        {
            let mut out = self.output.borrow_mut();
            write!(out, "{prompt}")?;
            out.flush()?;
        }
        let mut line = String::new();
        if self.input.borrow_mut().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    pub fn println(&self, text: &str) -> io::Result<()> {
        let mut out = self.output.borrow_mut();
        writeln!(out, "{text}")?;
        out.flush()
    }

    /// Asks until the answer is `y`, `yes`, `n` or `no`. End of input counts
    /// as no.
    pub fn confirm(&self, question: &str) -> io::Result<bool> {
        let prompt = format!("{question} (y/n): ");
        loop {
            let Some(answer) = self.read_line(&prompt)? else {
                return Ok(false);
            };
            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.println("please answer y or n")?,
            }
        }
    }
}

impl SaveDecider for Console {
    fn confirm_save(&mut self, path: &Path) -> scribe::Result<bool> {
        Ok(self.confirm(&format!("save changes to {}?", path.display()))?)
    }
}
