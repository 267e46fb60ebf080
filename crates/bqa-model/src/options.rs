use bqa_delegate::BaseOptions;

/// Options for creating a question answerer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuestionAnswererOptions {
    pub base_options: BaseOptions,
}

impl QuestionAnswererOptions {
    pub fn builder() -> QuestionAnswererOptionsBuilder {
        QuestionAnswererOptionsBuilder::default()
    }
}

#[derive(Debug, Default, Clone)]
pub struct QuestionAnswererOptionsBuilder {
    base_options: Option<BaseOptions>,
}

impl QuestionAnswererOptionsBuilder {
    pub fn set_base_options(mut self, base_options: BaseOptions) -> Self {
        self.base_options = Some(base_options);
        self
    }

    pub fn build(self) -> QuestionAnswererOptions {
        QuestionAnswererOptions {
            base_options: self.base_options.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bqa_delegate::Delegate;

    #[test]
    fn test_builder_carries_base_options() {
        let base = BaseOptions::builder().use_nnapi().build();
        let opts = QuestionAnswererOptions::builder()
            .set_base_options(base)
            .build();
        assert_eq!(opts.base_options.delegate(), Delegate::Nnapi);
    }

    #[test]
    fn test_builder_default() {
        let opts = QuestionAnswererOptions::builder().build();
        assert_eq!(opts, QuestionAnswererOptions::default());
    }
}
