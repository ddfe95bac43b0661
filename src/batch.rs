//! Many inputs, one watermark. Items are independent: a failure is reported, never fatal.

use rayon::prelude::*;

use crate::foundation::error::{WatermarkError, WatermarkResult};
use crate::model::WatermarkSpec;
use crate::pipeline::{WatermarkedImage, apply_detailed};

#[derive(Debug, Clone)]
pub struct NamedInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl NamedInput {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug)]
pub struct BatchItem {
    pub name: String,
    pub result: WatermarkResult<WatermarkedImage>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOpts {
    /// Override rayon worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
}

/// Apply `spec` to every input in parallel. Output order matches input order.
#[tracing::instrument(skip(inputs, spec), fields(count = inputs.len(), kind = spec.kind()))]
pub fn apply_batch(
    inputs: &[NamedInput],
    spec: &WatermarkSpec,
    opts: BatchOpts,
) -> WatermarkResult<Vec<BatchItem>> {
    let pool = build_thread_pool(opts.threads)?;
    let items: Vec<BatchItem> = pool.install(|| {
        inputs
            .par_iter()
            .map(|input| {
                let result = apply_detailed(&input.bytes, spec);
                if let Err(err) = &result {
                    tracing::warn!(name = %input.name, error = %err, "batch item failed");
                }
                BatchItem {
                    name: input.name.clone(),
                    result,
                }
            })
            .collect()
    });

    let failed = items.iter().filter(|i| i.result.is_err()).count();
    tracing::info!(total = items.len(), failed, "batch finished");
    Ok(items)
}

fn build_thread_pool(threads: Option<usize>) -> WatermarkResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(WatermarkError::validation("thread count must be > 0"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| WatermarkError::validation(format!("failed to build rayon thread pool: {e}")))
}
