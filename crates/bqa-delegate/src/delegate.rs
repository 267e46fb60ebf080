use std::fmt;

/// Execution backend a question-answering model is loaded with.
///
/// Chosen once, when the model handle is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delegate {
    /// GPU delegate.
    Gpu,
    /// Android Neural Networks API accelerator.
    Nnapi,
    /// Plain CPU inference pinned to a thread count.
    Cpu { num_threads: u32 },
}

impl Delegate {
    /// Short backend name ("gpu", "nnapi", "cpu").
    pub fn name(&self) -> &'static str {
        match self {
            Delegate::Gpu => "gpu",
            Delegate::Nnapi => "nnapi",
            Delegate::Cpu { .. } => "cpu",
        }
    }
}

impl fmt::Display for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delegate::Cpu { num_threads } => write!(f, "cpu({} threads)", num_threads),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Delegate::Gpu.to_string(), "gpu");
        assert_eq!(Delegate::Nnapi.to_string(), "nnapi");
        assert_eq!(Delegate::Cpu { num_threads: 4 }.to_string(), "cpu(4 threads)");
    }
}
