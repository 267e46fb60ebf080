use crate::delegate::Delegate;
use crate::select::DEFAULT_CPU_THREADS;

/// Base options handed to the runtime when a model is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseOptions {
    delegate: Delegate,
}

impl BaseOptions {
    pub fn builder() -> BaseOptionsBuilder {
        BaseOptionsBuilder::default()
    }

    pub fn from_delegate(delegate: Delegate) -> Self {
        Self { delegate }
    }

    pub fn delegate(&self) -> Delegate {
        self.delegate
    }

    /// Thread count for CPU inference, `None` when a hardware delegate is used.
    pub fn num_threads(&self) -> Option<u32> {
        match self.delegate {
            Delegate::Cpu { num_threads } => Some(num_threads),
            _ => None,
        }
    }
}

impl Default for BaseOptions {
    fn default() -> Self {
        Self::from_delegate(Delegate::Cpu {
            num_threads: DEFAULT_CPU_THREADS,
        })
    }
}

/// Builder for [`BaseOptions`]. The last delegate call wins.
#[derive(Debug, Default, Clone)]
pub struct BaseOptionsBuilder {
    delegate: Option<Delegate>,
}

impl BaseOptionsBuilder {
    pub fn use_gpu(mut self) -> Self {
        self.delegate = Some(Delegate::Gpu);
        self
    }

    pub fn use_nnapi(mut self) -> Self {
        self.delegate = Some(Delegate::Nnapi);
        self
    }

    pub fn set_num_threads(mut self, num_threads: u32) -> Self {
        self.delegate = Some(Delegate::Cpu { num_threads });
        self
    }

    pub fn build(self) -> BaseOptions {
        self.delegate
            .map(BaseOptions::from_delegate)
            .unwrap_or_default()
    }
}
