//! Wire types for the work item REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A work item as returned by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkItem {
    pub id: i64,
    #[serde(default)]
    pub rev: Option<i64>,
    #[serde(default)]
    pub url: String,
    /// Field reference name (e.g. `System.Title`) to value.
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub relations: Option<Vec<WorkItemRelation>>,
}

impl WorkItem {
    /// String value of a field, if present and textual.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.field_str("System.Title")
    }

    pub fn state(&self) -> Option<&str> {
        self.field_str("System.State")
    }
}

/// A link from one work item to another resource.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkItemRelation {
    pub rel: String,
    pub url: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Which optional parts of a work item the server should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkItemExpand {
    None,
    Relations,
    Fields,
    Links,
    All,
}

impl WorkItemExpand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Relations => "Relations",
            Self::Fields => "Fields",
            Self::Links => "Links",
            Self::All => "All",
        }
    }
}

/// An iteration (sprint) of a team.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamIteration {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub attributes: IterationAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationAttributes {
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_frame: Option<String>,
}

/// Fields to set when creating or updating a work item.
///
/// Only fields that are `Some` are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkItemFields {
    pub area_path: Option<String>,
    pub team_project: Option<String>,
    pub iteration_path: Option<String>,
    pub title: Option<String>,
    pub state: Option<String>,
    pub work_item_type: Option<String>,
    pub assigned_to: Option<String>,
    pub activity: Option<String>,
}

impl WorkItemFields {
    /// Build the JSON patch document replacing every present field.
    pub fn patch_document(&self) -> Vec<PatchOperation> {
        let fields = [
            ("/fields/System.AreaPath", &self.area_path),
            ("/fields/System.TeamProject", &self.team_project),
            ("/fields/System.IterationPath", &self.iteration_path),
            ("/fields/System.Title", &self.title),
            ("/fields/System.State", &self.state),
            ("/fields/System.WorkItemType", &self.work_item_type),
            ("/fields/System.AssignedTo", &self.assigned_to),
            ("/fields/Microsoft.VSTS.Common.Activity", &self.activity),
        ];

        fields
            .into_iter()
            .filter_map(|(path, value)| {
                value
                    .as_ref()
                    .map(|v| PatchOperation::new(PatchOp::Replace, path, Value::String(v.clone())))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
}

/// One operation of a JSON patch document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    pub value: Value,
}

impl PatchOperation {
    pub fn new(op: PatchOp, path: impl Into<String>, value: Value) -> Self {
        Self {
            op,
            path: path.into(),
            value,
        }
    }

    /// Operation linking `url` to the patched item with relation type `rel`.
    pub fn add_relation(rel: &str, url: &str) -> Self {
        Self::new(
            PatchOp::Add,
            "/relations/-",
            serde_json::json!({ "rel": rel, "url": url }),
        )
    }
}

/// Envelope of list responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    pub value: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_document_skips_absent_fields() {
        let fields = WorkItemFields {
            title: Some("Fix login".into()),
            state: Some("Active".into()),
            ..Default::default()
        };
        let doc = fields.patch_document();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc[0].path, "/fields/System.Title");
        assert_eq!(doc[1].path, "/fields/System.State");
        assert!(doc.iter().all(|op| op.op == PatchOp::Replace));
    }

    #[test]
    fn patch_document_serializes_as_json_patch() {
        let fields = WorkItemFields {
            activity: Some("Development".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(fields.patch_document()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "op": "replace",
                "path": "/fields/Microsoft.VSTS.Common.Activity",
                "value": "Development"
            }])
        );
    }

    #[test]
    fn add_relation_targets_relation_list() {
        let op = PatchOperation::add_relation("System.LinkTypes.Hierarchy-Forward", "https://x/1");
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "add");
        assert_eq!(json["path"], "/relations/-");
        assert_eq!(json["value"]["rel"], "System.LinkTypes.Hierarchy-Forward");
        assert_eq!(json["value"]["url"], "https://x/1");
    }

    #[test]
    fn work_item_deserializes_with_fields() {
        let json = r#"{
            "id": 42,
            "rev": 3,
            "url": "https://dev.example.com/_apis/wit/workItems/42",
            "fields": { "System.Title": "Broken build", "System.State": "New" }
        }"#;
        let item: WorkItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, 42);
        assert_eq!(item.title(), Some("Broken build"));
        assert_eq!(item.state(), Some("New"));
        assert!(item.relations.is_none());
    }

    #[test]
    fn iteration_deserializes_dates() {
        let json = r#"{
            "id": "a1b2",
            "name": "Sprint 12",
            "path": "Project\\Sprint 12",
            "attributes": {
                "startDate": "2024-03-04T00:00:00Z",
                "finishDate": "2024-03-15T00:00:00Z",
                "timeFrame": "current"
            }
        }"#;
        let iteration: TeamIteration = serde_json::from_str(json).unwrap();
        assert_eq!(iteration.name, "Sprint 12");
        assert_eq!(iteration.attributes.time_frame.as_deref(), Some("current"));
        assert!(iteration.attributes.start_date.unwrap() < iteration.attributes.finish_date.unwrap());
    }
}
