use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable row identity. Independent of the row's display position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(Uuid);

impl RowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of comparing a prediction against the row's threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Flag {
    /// Not computed yet, or cleared.
    #[default]
    Unset,
    Ok,
    High,
    Err,
}

impl Flag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "",
            Self::Ok => "OK",
            Self::High => "HIGH",
            Self::Err => "ERR",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.trim() {
            "" => Ok(Self::Unset),
            "OK" => Ok(Self::Ok),
            "HIGH" => Ok(Self::High),
            "ERR" => Ok(Self::Err),
            other => Err(format!("unknown output flag '{other}'")),
        }
    }
}

/// One data-entry record.
///
/// `fields` always holds exactly one raw value per schema feature. Outputs are
/// only ever set or cleared as a pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    id: RowId,
    position: usize,
    fields: Vec<String>,
    threshold: String,
    output: String,
    flag: Flag,
}

impl Row {
    pub(crate) fn new(position: usize, fields: Vec<String>, threshold: String) -> Self {
        Self {
            id: RowId::new(),
            position,
            fields,
            threshold,
            output: String::new(),
            flag: Flag::Unset,
        }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    /// 1-based display rank.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn threshold(&self) -> &str {
        &self.threshold
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn flag(&self) -> Flag {
        self.flag
    }

    /// Feature values followed by the threshold value.
    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.threshold.as_str()))
    }

    /// Every input value is blank or whitespace.
    pub fn is_blank(&self) -> bool {
        self.inputs().all(|v| v.trim().is_empty())
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    pub(crate) fn set_inputs(&mut self, fields: Vec<String>, threshold: String) {
        self.fields = fields;
        self.threshold = threshold;
    }

    /// Replaces features and threshold from a combined input vector.
    pub(crate) fn replace_inputs(&mut self, mut inputs: Vec<String>) {
        let threshold = inputs.pop().unwrap_or_default();
        self.set_inputs(inputs, threshold);
    }

    pub(crate) fn set_outputs(&mut self, output: String, flag: Flag) {
        self.output = output;
        self.flag = flag;
    }

    pub(crate) fn clear_outputs(&mut self) {
        self.set_outputs(String::new(), Flag::Unset);
    }
}
