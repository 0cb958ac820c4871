const INDENT: usize = 2;

/// Line-oriented GLSL text builder.
#[derive(Debug, Default)]
pub(crate) struct GlslWriter {
    out: String,
    indent: usize,
}

impl GlslWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indent(&mut self) {
        self.indent += INDENT;
    }

    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(INDENT);
    }

    pub fn line(&mut self, s: &str) {
        for _ in 0..self.indent {
            self.out.push(' ');
        }
        self.out.push_str(s);
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    pub fn finish(self) -> String {
        self.out
    }
}
