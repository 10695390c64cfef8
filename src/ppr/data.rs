use crate::error::Result;
use crate::{Persist, SerializationPhase, SparseVec, VertexId, Weight};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed-point scale of the quantized index.
pub const QUANTUM: Weight = 65535.0;

/// Persistent state of one vertex.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexData {
    /// This vertex's ppr vector, either loaded from an index or collected.
    pub ppr: SparseVec,
    /// Flow still in transit when the decomposition stopped, keyed by source.
    pub flow: SparseVec,
    /// Weight retained here, keyed by source.
    pub residual: SparseVec,
}

/// 16-bit fixed-point copy of `ppr`. Entries that round to zero are dropped.
pub fn quantize(ppr: &SparseVec) -> BTreeMap<VertexId, u16> {
    ppr.iter()
        .filter_map(|(&id, &weight)| {
            let quantized = (weight * QUANTUM) as u16;
            (quantized > 0).then_some((id, quantized))
        })
        .collect()
}

/// Inverse of [`quantize`] up to normalization: weights come back divided
/// by their sum, so a loaded vector always sums to one.
pub fn dequantize(counter: &BTreeMap<VertexId, u16>) -> SparseVec {
    let sum: Weight = counter.values().map(|&count| count as Weight).sum();
    if sum == 0.0 {
        return SparseVec::new();
    }

    counter
        .iter()
        .map(|(&id, &count)| (id, count as Weight / sum))
        .collect()
}

impl Persist for VertexData {
    fn save(&self, phase: SerializationPhase) -> Result<serde_json::Value> {
        let value = match phase {
            SerializationPhase::Index => serde_json::to_value(quantize(&self.ppr))?,
            SerializationPhase::Full => serde_json::to_value(self)?,
        };
        Ok(value)
    }

    fn load(phase: SerializationPhase, value: serde_json::Value) -> Result<Self> {
        match phase {
            SerializationPhase::Index => {
                let counter: BTreeMap<VertexId, u16> = serde_json::from_value(value)?;
                Ok(VertexData {
                    ppr: dequantize(&counter),
                    ..VertexData::default()
                })
            }
            SerializationPhase::Full => Ok(serde_json::from_value(value)?),
        }
    }
}
