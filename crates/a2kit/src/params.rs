//! Task parameters as handed over by an orchestration framework.

use crate::error::{Error, Result};
use crate::types::{DesiredState, ItemKind, Request};
use serde::Deserialize;

/// `name` may be a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NameParam {
    /// A single name
    One(String),
    /// Zero or more names; empty means query only
    Many(Vec<String>),
}

impl NameParam {
    fn into_vec(self) -> Vec<String> {
        match self {
            NameParam::One(name) => vec![name],
            NameParam::Many(names) => names,
        }
    }
}

/// Raw invocation parameters: `item`, `name`, `state`.
///
/// Task runners pass unset parameters as `null`, so a `null` name is the
/// same as an omitted one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Params {
    /// Kind of unit
    pub item: ItemKind,
    /// Name or names; omitted, `null` or empty means query only
    #[serde(default)]
    pub name: Option<NameParam>,
    /// Desired state; required unless `name` is empty
    #[serde(default)]
    pub state: Option<DesiredState>,
}

impl Params {
    /// Parse parameters from a JSON document.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Convert into a validated [`Request`].
    pub fn into_request(self) -> Result<Request> {
        let request = Request {
            kind: self.item,
            names: self.name.map(NameParam::into_vec).unwrap_or_default(),
            state: self.state,
        };
        if !request.is_query() && request.state.is_none() {
            return Err(Error::InvalidRequest(
                "parameter 'state' is required when 'name' is not empty".to_string(),
            ));
        }
        request.validate()?;
        Ok(request)
    }
}
