//! Input shapes accepted by [`compress`](crate::ScaleDownCompressor::compress)
//! and the dispatch plan they resolve to.
//!
//! | context   | prompt    | plan                              |
//! |-----------|-----------|-----------------------------------|
//! | scalar    | scalar    | [`Dispatch::Single`]              |
//! | N items   | N items   | [`Dispatch::Batch`] (index-paired)|
//! | N items   | scalar    | [`Dispatch::Broadcast`] (prompt repeated)  |
//! | scalar    | N items   | [`Dispatch::Broadcast`] (context repeated) |

use crate::error::{Result, ScaleDownError};

/// A context or prompt argument: one string or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptInput {
    /// A single value
    Single(String),
    /// An ordered sequence of values
    Many(Vec<String>),
}

impl PromptInput {
    /// Number of values carried.
    pub fn len(&self) -> usize {
        match self {
            PromptInput::Single(_) => 1,
            PromptInput::Many(items) => items.len(),
        }
    }

    /// True for an empty sequence.
    pub fn is_empty(&self) -> bool {
        matches!(self, PromptInput::Many(items) if items.is_empty())
    }
}

impl From<String> for PromptInput {
    fn from(value: String) -> Self {
        PromptInput::Single(value)
    }
}

impl From<&str> for PromptInput {
    fn from(value: &str) -> Self {
        PromptInput::Single(value.to_string())
    }
}

impl From<&String> for PromptInput {
    fn from(value: &String) -> Self {
        PromptInput::Single(value.clone())
    }
}

impl From<Vec<String>> for PromptInput {
    fn from(values: Vec<String>) -> Self {
        PromptInput::Many(values)
    }
}

impl From<Vec<&str>> for PromptInput {
    fn from(values: Vec<&str>) -> Self {
        PromptInput::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for PromptInput {
    fn from(values: &[&str]) -> Self {
        PromptInput::Many(values.iter().map(|s| (*s).to_string()).collect())
    }
}

impl From<&[String]> for PromptInput {
    fn from(values: &[String]) -> Self {
        PromptInput::Many(values.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for PromptInput {
    fn from(values: [&str; N]) -> Self {
        PromptInput::Many(values.iter().map(|s| (*s).to_string()).collect())
    }
}

/// Which argument was the sequence in a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastSide {
    /// N contexts share one prompt
    Contexts,
    /// N prompts share one context
    Prompts,
}

/// How a `compress` call fans out into requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// One request, one result.
    Single {
        /// Context text
        context: String,
        /// Prompt text
        prompt: String,
    },
    /// One request per `(context, prompt)` pair.
    Batch(Vec<(String, String)>),
    /// The scalar is paired with every item.
    Broadcast {
        /// The repeated value
        scalar: String,
        /// The sequence being fanned out
        items: Vec<String>,
        /// Whether `items` are contexts or prompts
        side: BroadcastSide,
    },
}

impl Dispatch {
    /// Decide the dispatch plan for a pair of inputs.
    ///
    /// Two sequences must have equal length; mismatches are rejected rather
    /// than truncated.
    pub fn resolve(context: PromptInput, prompt: PromptInput) -> Result<Self> {
        match (context, prompt) {
            (PromptInput::Single(context), PromptInput::Single(prompt)) => {
                Ok(Dispatch::Single { context, prompt })
            },
            (PromptInput::Many(contexts), PromptInput::Many(prompts)) => {
                if contexts.len() != prompts.len() {
                    return Err(ScaleDownError::InvalidInput(format!(
                        "context and prompt lists differ in length ({} vs {})",
                        contexts.len(),
                        prompts.len()
                    )));
                }
                Ok(Dispatch::Batch(contexts.into_iter().zip(prompts).collect()))
            },
            (PromptInput::Many(contexts), PromptInput::Single(prompt)) => Ok(Dispatch::Broadcast {
                scalar: prompt,
                items: contexts,
                side: BroadcastSide::Contexts,
            }),
            (PromptInput::Single(context), PromptInput::Many(prompts)) => Ok(Dispatch::Broadcast {
                scalar: context,
                items: prompts,
                side: BroadcastSide::Prompts,
            }),
        }
    }

    /// Number of requests this plan issues.
    pub fn len(&self) -> usize {
        match self {
            Dispatch::Single { .. } => 1,
            Dispatch::Batch(pairs) => pairs.len(),
            Dispatch::Broadcast { items, .. } => items.len(),
        }
    }

    /// True when no request would be issued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into `(context, prompt)` pairs in input order.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        match self {
            Dispatch::Single { context, prompt } => vec![(context, prompt)],
            Dispatch::Batch(pairs) => pairs,
            Dispatch::Broadcast {
                scalar,
                items,
                side: BroadcastSide::Contexts,
            } => items
                .into_iter()
                .map(|context| (context, scalar.clone()))
                .collect(),
            Dispatch::Broadcast {
                scalar,
                items,
                side: BroadcastSide::Prompts,
            } => items
                .into_iter()
                .map(|prompt| (scalar.clone(), prompt))
                .collect(),
        }
    }
}
