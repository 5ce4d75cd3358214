//! Typed pipeline elements
//!
//! Tagged records are classified into a closed set of kinds by tag name.
//! Unknown tags are ignored. Missing attributes become empty strings; nothing
//! here validates required fields.

use serde::{Deserialize, Serialize};
use crate::tag::TaggedElement;

/// Language of a dependency unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Python,
    Sql,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Sql => "sql",
        }
    }

    /// Unit type for a tag name, if it names a dependency unit
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "python" => Some(Self::Python),
            "sql" => Some(Self::Sql),
            _ => None,
        }
    }
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element kind chosen from the tag name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Task,
    Connection,
    Unit(UnitType),
}

impl ElementKind {
    /// Classify a tag name; `None` for tags outside the vocabulary
    pub fn classify(tag: &str) -> Option<Self> {
        match tag {
            "task" => Some(Self::Task),
            "connection" => Some(Self::Connection),
            other => UnitType::from_tag(other).map(Self::Unit),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Connection => "connection",
            Self::Unit(unit_type) => unit_type.as_str(),
        }
    }
}

/// Interpret a boolean-ish attribute value
fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

/// A scheduled task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,

    /// Schedule expression (cron-like, not interpreted)
    pub schedule: String,

    pub active: String,

    /// Ordered step list, kept as declared
    pub steps: String,

    pub force_build: String,

    pub code: String,

    /// Declared `type` attribute of the task tag, e.g. "python" or "sql"
    pub unit_type: String,
}

impl Task {
    pub fn from_tagged(element: &TaggedElement) -> Self {
        Self {
            id: element.get_or_empty("id").to_string(),
            schedule: element.get_or_empty("schedule").to_string(),
            active: element.get_or_empty("active").to_string(),
            steps: element.get_or_empty("steps").to_string(),
            force_build: element.get_or_empty("force_build").to_string(),
            code: element.code().to_string(),
            unit_type: element.attribute("type").unwrap_or_default().to_string(),
        }
    }

    pub fn is_active(&self) -> bool {
        is_truthy(&self.active)
    }

    pub fn forces_build(&self) -> bool {
        is_truthy(&self.force_build)
    }
}

/// Credentials for an external system
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub host: String,
    pub port: String,
    pub username: String,

    /// Never serialized or printed
    #[serde(skip_serializing, default)]
    pub password: String,
}

impl Connection {
    pub fn from_tagged(element: &TaggedElement) -> Self {
        Self {
            id: element.get_or_empty("id").to_string(),
            host: element.get_or_empty("host").to_string(),
            port: element.get_or_empty("port").to_string(),
            username: element.get_or_empty("username").to_string(),
            password: element.get_or_empty("password").to_string(),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A dependency unit (`<sql>` or `<python>`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    pub table: String,
    pub schema: String,
    pub database: String,

    /// Id of a [`Connection`]
    pub connection: String,

    /// Materialization strategy, e.g. "incremental" or "full"
    pub materialization: String,

    pub primary_key: String,

    /// Comma-separated ids of the units this one reads from
    pub inputs: String,

    pub schema_change: String,
    pub code: String,

    #[serde(rename = "type")]
    pub unit_type: UnitType,
}

impl Table {
    /// An empty unit of the given type
    pub fn new(id: impl Into<String>, unit_type: UnitType) -> Self {
        Self {
            id: id.into(),
            table: String::new(),
            schema: String::new(),
            database: String::new(),
            connection: String::new(),
            materialization: String::new(),
            primary_key: String::new(),
            inputs: String::new(),
            schema_change: String::new(),
            code: String::new(),
            unit_type,
        }
    }

    pub fn with_inputs(mut self, inputs: impl Into<String>) -> Self {
        self.inputs = inputs.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn from_tagged(element: &TaggedElement, unit_type: UnitType) -> Self {
        Self {
            id: element.get_or_empty("id").to_string(),
            table: element.get_or_empty("table").to_string(),
            schema: element.get_or_empty("schema").to_string(),
            database: element.get_or_empty("database").to_string(),
            connection: element.get_or_empty("connection").to_string(),
            materialization: element.get_or_empty("materialization").to_string(),
            primary_key: element.get_or_empty("primary_key").to_string(),
            inputs: element.get_or_empty("inputs").to_string(),
            schema_change: element.get_or_empty("schema_change").to_string(),
            code: element.code().to_string(),
            unit_type,
        }
    }

    /// Declared inputs split on `,`, verbatim
    ///
    /// An empty `inputs` attribute yields no ids; otherwise every piece is
    /// kept, including empty ones from stray commas.
    pub fn input_ids(&self) -> Vec<String> {
        if self.inputs.is_empty() {
            return Vec::new();
        }
        self.inputs.split(',').map(str::to_string).collect()
    }
}

/// A classified element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Task(Task),
    Connection(Connection),
    Unit(Table),
}

impl Element {
    /// Build the typed element for a tagged record, or `None` for unknown tags
    pub fn from_tagged(element: &TaggedElement) -> Option<Self> {
        let kind = ElementKind::classify(element.element_type())?;
        Some(match kind {
            ElementKind::Task => Element::Task(Task::from_tagged(element)),
            ElementKind::Connection => Element::Connection(Connection::from_tagged(element)),
            ElementKind::Unit(unit_type) => Element::Unit(Table::from_tagged(element, unit_type)),
        })
    }

    pub fn id(&self) -> &str {
        match self {
            Element::Task(task) => &task.id,
            Element::Connection(connection) => &connection.id,
            Element::Unit(table) => &table.id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Task(_) => ElementKind::Task,
            Element::Connection(_) => ElementKind::Connection,
            Element::Unit(table) => ElementKind::Unit(table.unit_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::parse_tags;
    use pretty_assertions::assert_eq;

    #[test]
    fn classify_known_tags() {
        assert_eq!(ElementKind::classify("task"), Some(ElementKind::Task));
        assert_eq!(ElementKind::classify("connection"), Some(ElementKind::Connection));
        assert_eq!(ElementKind::classify("sql"), Some(ElementKind::Unit(UnitType::Sql)));
        assert_eq!(ElementKind::classify("python"), Some(ElementKind::Unit(UnitType::Python)));
        assert_eq!(ElementKind::classify("notebook"), None);
    }

    #[test]
    fn table_defaults_missing_attributes() {
        let tagged = TaggedElement::new("sql", "select 1").with_attribute("id", "orders");
        let table = match Element::from_tagged(&tagged) {
            Some(Element::Unit(table)) => table,
            other => panic!("expected unit, got {:?}", other),
        };

        assert_eq!(table.id, "orders");
        assert_eq!(table.schema, "");
        assert_eq!(table.materialization, "");
        assert_eq!(table.code, "select 1");
        assert_eq!(table.unit_type, UnitType::Sql);
        assert!(table.input_ids().is_empty());
    }

    #[test]
    fn task_without_id_still_classifies() {
        let tagged = TaggedElement::new("task", "").with_attribute("schedule", "@daily");
        let element = Element::from_tagged(&tagged).unwrap();

        assert_eq!(element.kind(), ElementKind::Task);
        assert_eq!(element.id(), "");
    }

    #[test]
    fn task_fields() {
        let elements = parse_tags(
            r#"<task id="nightly" schedule="0 2 * * *" active="True" steps="a,b" force_build="0" type="python">run()</task>"#,
        );
        let task = Task::from_tagged(&elements[0]);

        assert_eq!(task.id, "nightly");
        assert_eq!(task.schedule, "0 2 * * *");
        assert_eq!(task.steps, "a,b");
        assert_eq!(task.unit_type, "python");
        assert_eq!(task.code, "run()");
        assert!(task.is_active());
        assert!(!task.forces_build());
    }

    #[test]
    fn input_ids_split_verbatim() {
        let table = Table::new("t", UnitType::Sql).with_inputs("a, b,,c");
        assert_eq!(table.input_ids(), vec!["a", " b", "", "c"]);
    }

    #[test]
    fn connection_password_is_hidden() {
        let tagged = TaggedElement::new("connection", "")
            .with_attribute("id", "pg")
            .with_attribute("password", "hunter2");
        let connection = Connection::from_tagged(&tagged);

        assert_eq!(connection.password, "hunter2");
        assert!(!format!("{:?}", connection).contains("hunter2"));
        assert!(!serde_json::to_string(&connection).unwrap().contains("hunter2"));
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let tagged = TaggedElement::new("notes", "whatever").with_attribute("id", "n");
        assert!(Element::from_tagged(&tagged).is_none());
    }
}
