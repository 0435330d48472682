//! Input records
//!
//! [`LineItem`] and [`HeaderRecord`] are ordered field maps, the shape every
//! layout consumes. [`SampleItem`] and [`ReceptionHeader`] are the typed
//! records of the shipped reception form and convert into them.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One field value as supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Absent, or text with nothing but whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Plain text rendering (`210`, not `210.0`)
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Empty => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => (*n as i64).to_string(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Number(f64::from(n))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

static EMPTY: FieldValue = FieldValue::Empty;

/// Ordered name -> value map shared by the record types
macro_rules! field_record {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            fields: Vec<(String, FieldValue)>,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            /// Builder form of [`insert`](Self::insert)
            pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
                self.insert(field, value);
                self
            }

            /// Set a field, replacing an earlier value in place
            pub fn insert(&mut self, field: &str, value: impl Into<FieldValue>) {
                let value = value.into();
                match self.fields.iter_mut().find(|(name, _)| name == field) {
                    Some((_, slot)) => *slot = value,
                    None => self.fields.push((field.to_string(), value)),
                }
            }

            /// Value of a field; missing fields read as [`FieldValue::Empty`]
            pub fn get(&self, field: &str) -> &FieldValue {
                self.fields
                    .iter()
                    .find(|(name, _)| name == field)
                    .map(|(_, value)| value)
                    .unwrap_or(&EMPTY)
            }

            pub fn contains(&self, field: &str) -> bool {
                self.fields.iter().any(|(name, _)| name == field)
            }

            pub fn field_names(&self) -> impl Iterator<Item = &str> {
                self.fields.iter().map(|(name, _)| name.as_str())
            }

            pub fn len(&self) -> usize {
                self.fields.len()
            }

            pub fn is_empty(&self) -> bool {
                self.fields.is_empty()
            }
        }

        impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for $name {
            fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
                let mut record = Self::new();
                for (k, v) in iter {
                    record.insert(&k.into(), v);
                }
                record
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.fields.len()))?;
                for (name, value) in &self.fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer
                    .deserialize_map(FieldsVisitor)
                    .map(|fields| Self { fields })
            }
        }
    };
}

/// Reads a JSON object keeping key order
struct FieldsVisitor;

impl<'de> Visitor<'de> for FieldsVisitor {
    type Value = Vec<(String, FieldValue)>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of field values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut fields: Vec<(String, FieldValue)> =
            Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, value)) = access.next_entry::<String, FieldValue>()? {
            match fields.iter_mut().find(|(n, _)| *n == name) {
                Some((_, slot)) => *slot = value,
                None => fields.push((name, value)),
            }
        }
        Ok(fields)
    }
}

field_record!(
    /// One record placed on one item row
    LineItem
);

field_record!(
    /// Fields for the header block
    HeaderRecord
);

/// Everything a `fill` run consumes: `{ "header": {...}, "items": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormData {
    #[serde(default)]
    pub header: HeaderRecord,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

/// A concrete cylinder sample on the reception form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleItem {
    pub codigo_muestra: String,
    pub identificacion_muestra: String,
    pub estructura: String,
    /// Design strength f'c in kg/cm²
    pub fc_kg_cm2: Option<f64>,
    pub fecha_moldeo: Option<String>,
    pub hora_moldeo: Option<String>,
    /// Age at break, in days
    pub edad: Option<u32>,
    pub fecha_rotura: Option<String>,
    pub requiere_densidad: bool,
}

impl From<&SampleItem> for LineItem {
    fn from(s: &SampleItem) -> Self {
        LineItem::new()
            .with("codigo_muestra", s.codigo_muestra.as_str())
            .with("identificacion_muestra", s.identificacion_muestra.as_str())
            .with("estructura", s.estructura.as_str())
            .with("fc_kg_cm2", s.fc_kg_cm2)
            .with("fecha_moldeo", s.fecha_moldeo.clone())
            .with("hora_moldeo", s.hora_moldeo.clone())
            .with("edad", s.edad)
            .with("fecha_rotura", s.fecha_rotura.clone())
            .with("requiere_densidad", s.requiere_densidad)
    }
}

/// Header block of the reception form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceptionHeader {
    pub numero_recepcion: String,
    pub numero_cotizacion: Option<String>,
    pub numero_ot: String,
    pub codigo_trazabilidad: Option<String>,
    pub asunto: Option<String>,
    pub fecha_recepcion: Option<String>,
    pub fecha_estimada_culminacion: Option<String>,
    pub cliente: String,
    pub ruc: Option<String>,
    pub domicilio_legal: Option<String>,
    pub persona_contacto: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub solicitante: Option<String>,
    pub domicilio_solicitante: Option<String>,
    pub proyecto: Option<String>,
    pub ubicacion: Option<String>,
    pub emision_fisica: bool,
    pub emision_digital: bool,
    pub entregado_por: Option<String>,
    pub recibido_por: Option<String>,
}

impl From<&ReceptionHeader> for HeaderRecord {
    fn from(h: &ReceptionHeader) -> Self {
        let text = |v: &Option<String>| FieldValue::from(v.clone());
        HeaderRecord::new()
            .with("numero_recepcion", h.numero_recepcion.as_str())
            .with("numero_cotizacion", text(&h.numero_cotizacion))
            .with("numero_ot", h.numero_ot.as_str())
            .with("codigo_trazabilidad", text(&h.codigo_trazabilidad))
            .with("asunto", text(&h.asunto))
            .with("fecha_recepcion", text(&h.fecha_recepcion))
            .with("fecha_estimada_culminacion", text(&h.fecha_estimada_culminacion))
            .with("cliente", h.cliente.as_str())
            .with("ruc", text(&h.ruc))
            .with("domicilio_legal", text(&h.domicilio_legal))
            .with("persona_contacto", text(&h.persona_contacto))
            .with("email", text(&h.email))
            .with("telefono", text(&h.telefono))
            .with("solicitante", text(&h.solicitante))
            .with("domicilio_solicitante", text(&h.domicilio_solicitante))
            .with("proyecto", text(&h.proyecto))
            .with("ubicacion", text(&h.ubicacion))
            .with("emision_fisica", h.emision_fisica)
            .with("emision_digital", h.emision_digital)
            .with("entregado_por", text(&h.entregado_por))
            .with("recibido_por", text(&h.recibido_por))
    }
}
