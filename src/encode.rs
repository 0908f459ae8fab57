#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use tracing::debug;

use crate::{
    constants::{DEFAULT_X_OFFSET, DEFAULT_Y_OFFSET, INPUT_PREFIX, STATUS_PREFIX},
    error::CheckError,
    model::{Coordinate, Response},
};

/// Which kind of field key is being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A submitted input field.
    Input,
    /// The result marker rendered next to an input.
    Status,
}

impl Role {
    /// Returns the key prefix for this role.
    pub fn prefix(&self) -> &'static str {
        match self {
            Role::Input => INPUT_PREFIX,
            Role::Status => STATUS_PREFIX,
        }
    }
}

/// Platform index of the engine's `(0, 0)` coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOffsets {
    /// Added to every x coordinate.
    pub x: u32,
    /// Added to every y coordinate.
    pub y: u32,
}

impl Default for IndexOffsets {
    fn default() -> Self {
        Self {
            x: DEFAULT_X_OFFSET,
            y: DEFAULT_Y_OFFSET,
        }
    }
}

impl IndexOffsets {
    /// Returns these offsets with x moved one position earlier, as some
    /// platform releases start numbering answer boxes from one less.
    pub fn shifted_left(self) -> Option<Self> {
        Some(Self {
            x: self.x.checked_sub(1)?,
            y: self.y,
        })
    }
}

/// One entry of a submission payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedField {
    /// Field key derived from problem, coordinate, and role.
    pub key:      String,
    /// A single submitted value.
    pub value:    String,
    /// Set for multi-select values; the key may then repeat and must be sent
    /// as a list.
    pub repeated: bool,
}

impl EncodedField {
    /// Returns the key as it goes on the wire. Repeated keys carry a `[]`
    /// suffix so the platform rebuilds the list instead of keeping the last
    /// value.
    pub fn wire_key(&self) -> String {
        if self.repeated {
            format!("{}[]", self.key)
        } else {
            self.key.clone()
        }
    }
}

/// Flattens encoded fields into form pairs, preserving duplicate keys.
pub fn form_pairs(fields: &[EncodedField]) -> Vec<(String, String)> {
    fields
        .iter()
        .map(|field| (field.wire_key(), field.value.clone()))
        .collect()
}

/// A status key paired with the response it reports on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusKey<'r> {
    /// Identifier of the status element.
    pub key:      String,
    /// The response submitted at the same coordinate.
    pub response: &'r Response,
}

/// Builds positional field keys for one problem.
#[derive(Debug, Clone)]
pub struct ResponseEncoder<'p> {
    /// The problem's url name.
    problem_id: &'p str,
    /// Platform offsets applied to each coordinate.
    offsets:    IndexOffsets,
}

impl<'p> ResponseEncoder<'p> {
    /// Creates an encoder with the default platform offsets.
    pub fn new(problem_id: &'p str) -> Self {
        Self {
            problem_id,
            offsets: IndexOffsets::default(),
        }
    }

    /// Replaces the platform offsets.
    pub fn with_offsets(mut self, offsets: IndexOffsets) -> Self {
        self.offsets = offsets;
        self
    }

    /// Returns the offsets in use.
    pub fn offsets(&self) -> IndexOffsets {
        self.offsets
    }

    /// Returns the key for `coordinate` under `role`, e.g.
    /// `input_<problem>_2_1` for `(0, 0)` with default offsets.
    ///
    /// Fails when the offset coordinate does not fit the platform's index
    /// range.
    pub fn field_key(&self, role: Role, coordinate: Coordinate) -> Result<String, CheckError> {
        let (Some(x), Some(y)) = (
            coordinate.x.checked_add(self.offsets.x),
            coordinate.y.checked_add(self.offsets.y),
        ) else {
            return Err(CheckError::configuration(format!(
                "`{}`: box index {coordinate} is out of range",
                self.problem_id
            )));
        };
        Ok(format!("{}_{}_{x}_{y}", role.prefix(), self.problem_id))
    }

    /// Recovers the role and coordinate a key was built from.
    ///
    /// Returns `None` for keys of another problem, keys that don't parse, or
    /// keys whose indexes lie below the offsets.
    pub fn decode_key(&self, key: &str) -> Option<(Role, Coordinate)> {
        [Role::Input, Role::Status].into_iter().find_map(|role| {
            let rest = key
                .strip_prefix(role.prefix())?
                .strip_prefix('_')?
                .strip_prefix(self.problem_id)?
                .strip_prefix('_')?;
            let (x, y) = rest.split_once('_')?;
            let x = x.parse::<u32>().ok()?.checked_sub(self.offsets.x)?;
            let y = y.parse::<u32>().ok()?.checked_sub(self.offsets.y)?;
            Some((role, Coordinate::new(x, y)))
        })
    }

    /// Checks that every response has exactly one coordinate.
    fn check_lengths(
        &self,
        responses: &[Response],
        coordinates: &[Coordinate],
    ) -> Result<(), CheckError> {
        if responses.len() != coordinates.len() {
            return Err(CheckError::configuration(format!(
                "`{}`: {} responses but {} box indexes",
                self.problem_id,
                responses.len(),
                coordinates.len()
            )));
        }
        Ok(())
    }

    /// Encodes responses into submission fields.
    ///
    /// A multi-select response yields one field per selected value, all under
    /// the same key.
    pub fn encode(
        &self,
        role: Role,
        responses: &[Response],
        coordinates: &[Coordinate],
    ) -> Result<Vec<EncodedField>, CheckError> {
        self.check_lengths(responses, coordinates)?;

        let mut fields = Vec::with_capacity(responses.len());
        for (response, coordinate) in responses.iter().zip(coordinates) {
            let key = self.field_key(role, *coordinate)?;
            match response {
                Response::Single(value) => fields.push(EncodedField {
                    key,
                    value: value.clone(),
                    repeated: false,
                }),
                Response::Multiple(values) => {
                    fields.extend(values.iter().map(|value| EncodedField {
                        key:      key.clone(),
                        value:    value.clone(),
                        repeated: true,
                    }));
                }
            }
        }

        debug!(problem = self.problem_id, ?fields, "encoded responses");
        Ok(fields)
    }

    /// Builds the status keys the extractor searches for, one per response.
    pub fn status_keys<'r>(
        &self,
        responses: &'r [Response],
        coordinates: &[Coordinate],
    ) -> Result<Vec<StatusKey<'r>>, CheckError> {
        self.check_lengths(responses, coordinates)?;

        responses
            .iter()
            .zip(coordinates)
            .map(|(response, coordinate)| {
                Ok(StatusKey {
                    key: self.field_key(Role::Status, *coordinate)?,
                    response,
                })
            })
            .collect()
    }
}
