use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Context;

use super::Encoder;

/// Encoder backed by a fixed text → vector table. Records every text it was asked to encode.
#[derive(Default)]
pub struct TableEncoder {
    table: HashMap<String, Vec<f32>>,
    calls: RefCell<Vec<String>>,
}

impl TableEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, text: &str, v: &[f32]) -> Self {
        self.table.insert(text.to_string(), v.to_vec());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Encoder for TableEncoder {
    fn encode(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.borrow_mut().push(text.to_string());
        self.table
            .get(text)
            .cloned()
            .with_context(|| format!("no embedding for {text:?}"))
    }
}
