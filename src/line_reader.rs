use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::Editor;

/// Line editor for the interactive prompt. History is loaded on startup
/// and written back when the reader is dropped.
pub struct LineReader {
    rl: Editor<(), FileHistory>,
    history_file: String,
}

impl Drop for LineReader {
    fn drop(&mut self) {
        self.rl.save_history(&self.history_file).ok();
    }
}

pub enum LineReadStatus {
    Line(String),
    Done,
}

impl LineReader {
    pub fn new(history_file: &str) -> LineReader {
        let mut rl = Editor::<(), FileHistory>::new().expect("Failed to create line editor");
        rl.load_history(history_file).ok();
        LineReader {
            rl,
            history_file: history_file.into(),
        }
    }

    pub fn readline(&mut self, prompt: &str) -> LineReadStatus {
        let res = self.rl.readline(prompt);

        match res {
            Ok(line) => {
                self.rl.add_history_entry(line.as_str()).ok();
                LineReadStatus::Line(line)
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => LineReadStatus::Done,
            Err(_) => LineReadStatus::Done,
        }
    }
}
