//! Graph schema and the instructions sent to the Cypher generation/review models.

/// Node labels with the properties the scraper stores on them.
pub const ENTITIES: &[(&str, &[&str])] = &[
    (
        "Part",
        &[
            "id",
            "url",
            "name",
            "partselect_num",
            "manufacturer_part_num",
            "price",
            "status",
            "difficulty",
            "repair_time",
            "description",
            "works_with_products",
            "web_id",
        ],
    ),
    ("Model", &["model_num", "name", "url"]),
    ("Symptom", &["name"]),
    ("Brand", &["name"]),
    ("ProductType", &["name"]),
    ("Video", &["url", "name"]),
    ("Story", &["title", "content", "difficulty", "repair_time", "tools"]),
    ("QnA", &["question", "model", "answer", "date"]),
    ("Section", &["name", "url"]),
    ("Manual", &["name", "url"]),
    (
        "InstallationInstruction",
        &["title", "content", "difficulty", "repair_time", "tools"],
    ),
];

/// Relationship type, source label, target label.
pub const RELATIONSHIPS: &[(&str, &str, &str)] = &[
    ("MANUFACTURED_BY", "Part", "Manufacturer"),
    ("BRAND_DESTINATION", "Part", "Brand"),
    ("COMPATIBLE_WITH", "Part", "Model"),
    ("HAS_VIDEO", "Part", "Video"),
    ("FIXES_SYMPTOM", "Part", "Symptom"),
    ("HAS_STORY", "Part", "Story"),
    ("HAS_QNA", "Part", "QnA"),
    ("RELATED_TO", "Part", "Part"),
    ("REPLACES", "Part", "Part"),
    ("WORKS_WITH_PRODUCT_TYPE", "Part", "ProductType"),
    ("HAS_SECTION", "Model", "Section"),
    ("HAS_MANUAL", "Model", "Manual"),
    ("MADE_BY", "Model", "Brand"),
    ("IS", "Model", "ProductType"),
    ("HAS_PART", "Model", "Part"),
    ("HAS_INSTALLATION_INSTRUCTION", "Model", "InstallationInstruction"),
    ("HAS_SYMPTOM", "Model", "Symptom"),
    ("REFERENCES_PART", "QnA", "Part"),
    ("FEATURES_PART", "Video", "Part"),
    ("USES_PART", "InstallationInstruction", "Part"),
    ("USES_FIXING_PART", "Symptom", "Part"),
];

/// Instruction for reviewing a generated query.
pub const CORRECTION_INSTRUCTION: &str = "You are a Neo4j Cypher expert. Check the following Cypher query for syntax or logical errors. \
If you find any, fix them and return the corrected query. If there are none, return the query unchanged. \
Return only the Cypher query.";

/// Build the system instruction for Cypher generation.
pub fn generation_instruction(result_limit: usize) -> String {
    let entities = ENTITIES
        .iter()
        .map(|(label, props)| {
            let props = props
                .iter()
                .map(|p| format!("`{}`", p))
                .collect::<Vec<_>>()
                .join(", ");
            format!("- {} (Attributes: {})", label, props)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let relationships = RELATIONSHIPS
        .iter()
        .map(|(rel, from, to)| format!("- {rel}: `(:{from})-[:{rel}]->(:{to})`"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a helpful assistant that writes Cypher queries for a Neo4j graph of appliance parts and models, based on the user's question.

The database contains these entities:
{entities}

The entities are connected by these relationships:
{relationships}

Write one Cypher query answering the user's question. Do not include comments or explanations in the query.
The parameter `$threshold` is available if you need a similarity cut-off.

Limit the number of results returned to {result_limit}.

Reply with a JSON object of the form:
{{
    "cypher": <cypher query>
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_lists_every_entity_and_relationship() {
        let text = generation_instruction(10);
        for (label, _) in ENTITIES {
            assert!(text.contains(&format!("- {} (Attributes:", label)), "{}", label);
        }
        for (rel, _, _) in RELATIONSHIPS {
            assert!(text.contains(&format!("[:{}]", rel)), "{}", rel);
        }
        assert!(text.contains("Limit the number of results returned to 10."));
        assert!(text.contains("\"cypher\""));
    }

    #[test]
    fn relationship_rendering_shape() {
        let text = generation_instruction(5);
        assert!(text.contains("- COMPATIBLE_WITH: `(:Part)-[:COMPATIBLE_WITH]->(:Model)`"));
    }
}
