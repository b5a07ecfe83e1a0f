use rust_decimal::Decimal;

/// A single staged write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Set { key: String, value: String },
    Delete { key: String },
    ZAdd { key: String, member: String, score: Decimal },
    ZRem { key: String, member: String },
    RPush { key: String, value: String },
    LRem { key: String, value: String },
    HSetMany { key: String, fields: Vec<(String, String)> },
}

impl WriteOp {
    pub fn key(&self) -> &str {
        match self {
            WriteOp::Set { key, .. }
            | WriteOp::Delete { key }
            | WriteOp::ZAdd { key, .. }
            | WriteOp::ZRem { key, .. }
            | WriteOp::RPush { key, .. }
            | WriteOp::LRem { key, .. }
            | WriteOp::HSetMany { key, .. } => key,
        }
    }
}

/// Ordered list of writes committed as one unit through `BatchStore::commit`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(WriteOp::Set {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.push(WriteOp::Delete { key: key.into() })
    }

    pub fn zadd(
        &mut self,
        key: impl Into<String>,
        member: impl Into<String>,
        score: Decimal,
    ) -> &mut Self {
        self.push(WriteOp::ZAdd {
            key: key.into(),
            member: member.into(),
            score,
        })
    }

    pub fn zrem(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.push(WriteOp::ZRem {
            key: key.into(),
            member: member.into(),
        })
    }

    pub fn rpush(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(WriteOp::RPush {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn lrem(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(WriteOp::LRem {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn hset(
        &mut self,
        key: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.push(WriteOp::HSetMany {
            key: key.into(),
            fields: vec![(field.into(), value.into())],
        })
    }

    pub fn hset_many(&mut self, key: impl Into<String>, fields: Vec<(String, String)>) -> &mut Self {
        self.push(WriteOp::HSetMany {
            key: key.into(),
            fields,
        })
    }

    fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_batch_preserves_op_order() {
        let mut batch = WriteBatch::new();
        batch
            .zadd("prices", "960", dec!(960))
            .rpush("level-960", "1")
            .hset("quote-1", "qty", "5");

        assert_eq!(batch.len(), 3);
        let keys: Vec<&str> = batch.ops().iter().map(WriteOp::key).collect();
        assert_eq!(keys, vec!["prices", "level-960", "quote-1"]);
    }
}
