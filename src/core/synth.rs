//! Document synthesis — frontmatter plus body for one NPC.

use rustc_hash::FxHashSet;
use serde_json::{Map, Value};

use super::coerce::PropertyValue;
use crate::schema::npc::document_identifier;

/// Tag every generated document carries.
pub const NPC_TAG: &str = "npc";
pub const TAGS_KEY: &str = "tags";
pub const FRONTMATTER_DELIMITER: &str = "---";

/// Build the frontmatter object. Properties keep their given order; `tags`
/// always comes last and always starts with [`NPC_TAG`]. A property named
/// `tags` adds to it rather than replacing it.
pub fn frontmatter<'a, I>(properties: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (&'a str, &'a PropertyValue)>,
{
    let mut map = Map::new();
    let mut tags = vec![Value::String(NPC_TAG.to_string())];
    let mut seen: FxHashSet<String> = FxHashSet::default();
    seen.insert(NPC_TAG.to_string());

    for (name, value) in properties {
        if name == TAGS_KEY {
            for tag in extra_tags(value) {
                let key = match &tag {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                if seen.insert(key) {
                    tags.push(tag);
                }
            }
            continue;
        }
        map.insert(name.to_string(), value.to_frontmatter());
    }

    map.insert(TAGS_KEY.to_string(), Value::Array(tags));
    map
}

fn extra_tags(value: &PropertyValue) -> Vec<Value> {
    match value.to_frontmatter() {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Render the full document text for an NPC.
pub fn synthesize<'a, I>(name: &str, properties: I) -> Result<String, serde_json::Error>
where
    I: IntoIterator<Item = (&'a str, &'a PropertyValue)>,
{
    let serialized = serde_json::to_string(&frontmatter(properties))?;
    let heading = document_identifier(name);
    Ok(format!(
        "{delim}\n{fm}\n{delim}\n\n# {heading}\n",
        delim = FRONTMATTER_DELIMITER,
        fm = serialized,
        heading = heading,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn tags_always_present() {
        let doc = synthesize("Gronk", std::iter::empty()).unwrap();
        assert_eq!(doc, "---\n{\"tags\":[\"npc\"]}\n---\n\n# Gronk\n");
    }

    #[test]
    fn properties_in_order_then_tags() {
        let race = PropertyValue::Link("Orc".to_string());
        let age = PropertyValue::Number(42.into());
        let born = PropertyValue::Date(NaiveDate::from_ymd_opt(2023, 5, 1).unwrap());
        let doc = synthesize("Gronk", [("race", &race), ("age", &age), ("born", &born)]).unwrap();
        assert_eq!(
            doc,
            "---\n{\"race\":\"[[Orc]]\",\"age\":42,\"born\":\"2023-05-01\",\"tags\":[\"npc\"]}\n---\n\n# Gronk\n"
        );
    }

    #[test]
    fn tags_property_extends_base_tag() {
        let tags = PropertyValue::List(vec!["villain".to_string()]);
        let fm = frontmatter([("tags", &tags)]);
        assert_eq!(fm["tags"], serde_json::json!(["npc", "villain"]));

        let dup = PropertyValue::Text("npc".to_string());
        let fm = frontmatter([("tags", &dup)]);
        assert_eq!(fm["tags"], serde_json::json!(["npc"]));
    }

    #[test]
    fn empty_name_uses_default_heading() {
        let doc = synthesize("", std::iter::empty()).unwrap();
        assert!(doc.ends_with("# new_npc\n"));
    }
}
