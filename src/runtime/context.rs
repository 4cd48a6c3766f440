/// Output sink consumed by `print`.
///
/// The interpreter never writes partial lines; every statement that produces
/// output hands over one complete line at a time.
pub trait SystemContext {
    fn writeln(&mut self, text: &str);
}

/// Writes to the process stdout.
pub struct StdioContext;

impl SystemContext for StdioContext {
    fn writeln(&mut self, text: &str) {
        println!("{text}");
    }
}

/// Captures output into an in-memory buffer, for tests.
pub struct BufferedContext {
    buffer: String,
}

impl BufferedContext {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    pub fn into_data(self) -> String {
        self.buffer
    }
}

impl Default for BufferedContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemContext for BufferedContext {
    fn writeln(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }
}
