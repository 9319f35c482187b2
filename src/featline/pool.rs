//! Example recycling

use crate::featline::example::Example;

/// Free list of examples. Released examples are reset and handed out again by
/// [`ExamplePool::acquire_empty`], so their feature buffers keep their capacity.
#[derive(Debug, Default)]
pub struct ExamplePool<L> {
    free: Vec<Example<L>>,
}

impl<L: Default> ExamplePool<L> {
    pub fn new() -> Self {
        Self { free: Vec::new() }
    }

    pub fn acquire_empty(&mut self) -> Example<L> {
        self.free.pop().unwrap_or_default()
    }

    pub fn release(&mut self, examples: impl IntoIterator<Item = Example<L>>) {
        for mut example in examples {
            example.reset();
            self.free.push(example);
        }
    }

    /// Examples waiting to be reused.
    pub fn available(&self) -> usize {
        self.free.len()
    }
}
