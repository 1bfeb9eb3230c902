// Form state and the edits that move it between revisions
use super::numeric::{normalize, normalize_integer, parse_strict, Bounds};
use super::setpoint::{build, GroupId, HumidityEntry, HumidityId, Payload, SetpointGroup};
use super::validity::{is_export_ready, is_valid};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A quick-add template for a setpoint group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub temperature: String,
    #[serde(default)]
    pub humidities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FormEdit {
    SetSystemId { value: String },
    SetCompact { compact: bool },
    AddGroup,
    RemoveGroup { group_id: GroupId },
    SetTemperature { group_id: GroupId, value: String },
    AddHumidity { group_id: GroupId },
    RemoveHumidity { group_id: GroupId, humidity_id: HumidityId },
    SetHumidity { group_id: GroupId, humidity_id: HumidityId, value: String },
    QuickAdd { preset: String },
    Reset,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("unknown setpoint group {0}")]
    UnknownGroup(GroupId),

    #[error("unknown humidity entry {humidity} in group {group}")]
    UnknownHumidity { group: GroupId, humidity: HumidityId },

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

/// One revision of the form. Edits never mutate a state in place; `apply`
/// returns the next revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormState {
    pub system_id: String,
    pub compact: bool,
    pub groups: Vec<SetpointGroup>,
    #[serde(skip)]
    default_system_id: String,
    #[serde(skip)]
    next_id: u64,
}

impl FormState {
    pub fn new(default_system_id: &str) -> Self {
        let system_id = normalize_integer(default_system_id, Bounds::UNBOUNDED);
        Self {
            system_id: system_id.clone(),
            compact: true,
            groups: Vec::new(),
            default_system_id: system_id,
            next_id: 1,
        }
    }

    /// Parsed system id, NaN when the field does not hold a number
    pub fn system_id(&self) -> f64 {
        parse_strict(&self.system_id).unwrap_or(f64::NAN)
    }

    pub fn payload(&self) -> Payload {
        build(self.system_id(), &self.groups)
    }

    pub fn is_valid(&self) -> bool {
        is_valid(self.system_id(), &self.groups)
    }

    pub fn is_export_ready(&self) -> bool {
        is_export_ready(self.system_id(), &self.groups)
    }

    pub fn apply(&self, edit: FormEdit, presets: &[Preset]) -> Result<FormState, FormError> {
        let mut next = self.clone();

        match edit {
            FormEdit::SetSystemId { value } => {
                next.system_id = normalize_integer(&value, Bounds::UNBOUNDED);
            }
            FormEdit::SetCompact { compact } => {
                next.compact = compact;
            }
            FormEdit::AddGroup => {
                let id = GroupId(next.allocate_id());
                next.groups.push(SetpointGroup::new(id, "", Vec::new()));
            }
            FormEdit::RemoveGroup { group_id } => {
                let index = next.group_index(group_id)?;
                next.groups.remove(index);
            }
            FormEdit::SetTemperature { group_id, value } => {
                let index = next.group_index(group_id)?;
                next.groups[index].temperature = normalize(&value, Bounds::UNBOUNDED);
            }
            FormEdit::AddHumidity { group_id } => {
                let index = next.group_index(group_id)?;
                let id = HumidityId(next.allocate_id());
                next.groups[index].humidities.push(HumidityEntry::new(id, ""));
            }
            FormEdit::RemoveHumidity {
                group_id,
                humidity_id,
            } => {
                let group = next.group_mut(group_id)?;
                let position = humidity_position(group, humidity_id)?;
                group.humidities.remove(position);
            }
            FormEdit::SetHumidity {
                group_id,
                humidity_id,
                value,
            } => {
                let group = next.group_mut(group_id)?;
                let position = humidity_position(group, humidity_id)?;
                group.humidities[position].nominal = normalize(&value, Bounds::PERCENT);
            }
            FormEdit::QuickAdd { preset } => {
                let template = presets
                    .iter()
                    .find(|p| p.name == preset)
                    .ok_or(FormError::UnknownPreset(preset))?;
                let group = next.group_from_preset(template);
                next.groups.push(group);
            }
            FormEdit::Reset => {
                // ids stay monotonic across resets
                next.groups.clear();
                next.system_id = next.default_system_id.clone();
            }
        }

        Ok(next)
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn group_index(&self, id: GroupId) -> Result<usize, FormError> {
        self.groups
            .iter()
            .position(|g| g.id == id)
            .ok_or(FormError::UnknownGroup(id))
    }

    fn group_mut(&mut self, id: GroupId) -> Result<&mut SetpointGroup, FormError> {
        self.groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(FormError::UnknownGroup(id))
    }

    fn group_from_preset(&mut self, preset: &Preset) -> SetpointGroup {
        let id = GroupId(self.allocate_id());
        let humidities = preset
            .humidities
            .iter()
            .map(|nominal| {
                HumidityEntry::new(
                    HumidityId(self.allocate_id()),
                    normalize(nominal, Bounds::PERCENT),
                )
            })
            .collect();
        SetpointGroup::new(id, normalize(&preset.temperature, Bounds::UNBOUNDED), humidities)
    }
}

fn humidity_position(group: &SetpointGroup, id: HumidityId) -> Result<usize, FormError> {
    group
        .humidities
        .iter()
        .position(|h| h.id == id)
        .ok_or(FormError::UnknownHumidity {
            group: group.id,
            humidity: id,
        })
}
