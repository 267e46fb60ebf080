/// Location of an answer span in the context passage, with its logit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pos {
    pub start: i32,
    pub end: i32,
    pub logit: f32,
}

/// One candidate answer returned by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct QaAnswer {
    pub text: String,
    pub pos: Pos,
}

impl QaAnswer {
    pub fn new(text: impl Into<String>, start: i32, end: i32, logit: f32) -> Self {
        Self {
            text: text.into(),
            pos: Pos { start, end, logit },
        }
    }

    /// Confidence of this answer.
    pub fn score(&self) -> f32 {
        self.pos.logit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_answer() {
        let a = QaAnswer::new("Jakarta", 10, 12, 7.25);
        assert_eq!(a.text, "Jakarta");
        assert_eq!(a.pos.start, 10);
        assert_eq!(a.pos.end, 12);
        assert_relative_eq!(a.score(), 7.25);
    }
}
