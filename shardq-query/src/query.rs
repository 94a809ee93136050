use shardq_key::ShardKeyValue;

/// Query descriptor bound at execution creation: the text plus
/// positional parameters. Routing decisions happen elsewhere; the
/// coordinator sends the same descriptor to every target shard.
#[derive(Clone, Debug)]
pub struct QuerySpec {
    pub text: String,
    pub params: Vec<ShardKeyValue>,
}

impl QuerySpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(text: impl Into<String>, params: Vec<ShardKeyValue>) -> Self {
        Self {
            text: text.into(),
            params,
        }
    }
}
