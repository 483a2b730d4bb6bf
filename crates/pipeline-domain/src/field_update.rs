use serde::{Serialize, Serializer};

/// A three-state edit for an optional field:
/// - `NoChange`: leave the current value alone
/// - `Set(value)`: replace it
/// - `Clear`: remove it
///
/// Serializes as the value for `Set` and `null` for `Clear`; pair it with
/// `#[serde(skip_serializing_if = "FieldUpdate::is_no_change")]` so that
/// untouched fields are left out of a request body.
///
/// # Example
///
/// ```
/// use pipeline_domain::FieldUpdate;
///
/// let mut label = Some("Retorno".to_string());
/// FieldUpdate::Set("Urgente".to_string()).apply_to(&mut label);
/// assert_eq!(label.as_deref(), Some("Urgente"));
///
/// FieldUpdate::<String>::Clear.apply_to(&mut label);
/// assert_eq!(label, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    #[default]
    NoChange,
    Set(T),
    Clear,
}

impl<T> FieldUpdate<T> {
    pub fn apply_to(self, field: &mut Option<T>) {
        match self {
            FieldUpdate::NoChange => {}
            FieldUpdate::Set(value) => *field = Some(value),
            FieldUpdate::Clear => *field = None,
        }
    }

    pub fn is_no_change(&self) -> bool {
        matches!(self, FieldUpdate::NoChange)
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    /// `Some` sets, `None` clears. Used for full-replace edits.
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(value) => FieldUpdate::Set(value),
            None => FieldUpdate::Clear,
        }
    }
}

impl<T: Serialize> Serialize for FieldUpdate<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldUpdate::Set(value) => value.serialize(serializer),
            FieldUpdate::NoChange | FieldUpdate::Clear => serializer.serialize_none(),
        }
    }
}
