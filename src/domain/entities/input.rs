/// A parsed command invocation
///
/// Built by [`InputParser`](crate::application::messaging::InputParser); an
/// `Input` always has a non-empty command token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// First word of the command line, lowercased, trigger removed
    pub command: String,
    /// Whole command line, lowercased, trigger removed
    pub command_raw: String,
    /// Remaining words of the command line
    pub args: Vec<String>,
    /// Every line after the command line
    pub lines: Vec<String>,
}

impl Input {
    /// Arguments joined back into a phrase
    pub fn joined_args(&self) -> String {
        self.args.join(" ")
    }

    /// Body lines joined with newlines
    pub fn body(&self) -> String {
        self.lines.join("\n")
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Names this input could refer to, most specific first: the whole
    /// command line, then ever shorter word prefixes down to the command.
    pub fn candidate_names(&self) -> Vec<String> {
        let mut names = vec![self.command_raw.clone()];
        for len in (0..self.args.len()).rev() {
            let mut name = self.command.clone();
            for arg in &self.args[..len] {
                name.push(' ');
                name.push_str(arg);
            }
            names.push(name);
        }
        names
    }
}
