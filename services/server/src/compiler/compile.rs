//! Component compilation
//!
//! Pure, deterministic translation of configuration components into a
//! runtime manifest. No I/O: identical component sets always yield
//! byte-identical manifests, which is what makes builds repeatable and
//! the compiler trivially testable.

use serde_json::{json, Value};

use crate::catalog::{Component, ComponentKind};
use crate::compiler::manifest::{Manifest, MemoryEntry};

/// Fixed first sentence of every instructions document
pub const PREAMBLE: &str = "You are an AI agent with specialized capabilities.";

/// Memory bodies beyond this length are cut in the instructions document.
/// Bounds the prompt size a single memory item can claim; the full body
/// still ships in the manifest's memory list.
pub const MEMORY_SECTION_LIMIT: usize = 4_000;

/// Marker appended to a truncated memory section
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated...]";

/// Compile configuration components into a runtime manifest.
///
/// Components are partitioned by kind and processed in input order.
pub fn compile(components: &[Component], model: &str) -> Manifest {
    let skills: Vec<&Component> = components
        .iter()
        .filter(|c| c.kind == ComponentKind::Skill)
        .collect();
    let tools: Vec<&Component> = components
        .iter()
        .filter(|c| c.kind == ComponentKind::Tool)
        .collect();
    let memory: Vec<&Component> = components
        .iter()
        .filter(|c| c.kind == ComponentKind::Memory)
        .collect();

    Manifest {
        instructions: build_instructions(&skills, &memory),
        tools: build_tools(&tools),
        memory: memory
            .iter()
            .map(|m| MemoryEntry {
                key: m.name.clone(),
                content: m.content.clone().unwrap_or_default(),
                description: m.description.clone(),
            })
            .collect(),
        skills: skills.iter().map(|s| s.name.clone()).collect(),
        model: model.to_string(),
    }
}

fn build_instructions(skills: &[&Component], memory: &[&Component]) -> String {
    let mut sections: Vec<String> = vec![PREAMBLE.to_string(), String::new()];

    if !skills.is_empty() {
        sections.push("# Your Skills".to_string());
        sections.push(String::new());
        for skill in skills {
            sections.push(format!("## {}", skill.name));
            if let Some(description) = &skill.description {
                sections.push(format!("*{}*", description));
                sections.push(String::new());
            }
            if let Some(content) = &skill.content {
                sections.push(content.clone());
            }
            sections.push(String::new());
        }
    }

    if !memory.is_empty() {
        sections.push("# Background Knowledge".to_string());
        sections.push(String::new());
        for item in memory {
            // CLAUDE.md gets top billing as project context
            if item.name.eq_ignore_ascii_case("CLAUDE.MD") {
                sections.push("## Project Context".to_string());
            } else {
                sections.push(format!("## {}", item.name));
            }
            if let Some(content) = &item.content {
                sections.push(truncate_section(content));
            }
            sections.push(String::new());
        }
    }

    sections.join("\n")
}

fn truncate_section(content: &str) -> String {
    if content.chars().count() <= MEMORY_SECTION_LIMIT {
        return content.to_string();
    }
    let mut truncated: String = content.chars().take(MEMORY_SECTION_LIMIT).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

fn build_tools(tools: &[&Component]) -> Vec<Value> {
    let mut definitions = Vec::new();

    for tool in tools {
        match &tool.config {
            Some(Value::Object(config)) => match config.get("tools") {
                // Pre-expanded definitions ship verbatim
                Some(Value::Array(expanded)) => definitions.extend(expanded.iter().cloned()),
                Some(_) => definitions.push(noop_tool(&tool.name)),
                None => definitions.push(synthesize_tool(tool, config.get("input_schema"))),
            },
            // Config present but not an object: degrade instead of failing
            Some(_) => definitions.push(noop_tool(&tool.name)),
            None => definitions.push(synthesize_tool(tool, None)),
        }
    }

    definitions
}

fn synthesize_tool(tool: &Component, schema: Option<&Value>) -> Value {
    let description = tool
        .description
        .clone()
        .unwrap_or_else(|| format!("MCP tool: {}", tool.name));
    let input_schema = schema
        .filter(|s| s.is_object())
        .cloned()
        .unwrap_or_else(empty_schema);

    json!({
        "name": tool.name,
        "description": description,
        "input_schema": input_schema,
    })
}

fn noop_tool(name: &str) -> Value {
    json!({
        "name": name,
        "description": format!("Tool '{}' is unavailable (malformed configuration)", name),
        "input_schema": empty_schema(),
    })
}

fn empty_schema() -> Value {
    json!({
        "type": "object",
        "properties": {},
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(name: &str, content: &str) -> Component {
        Component {
            kind: ComponentKind::Skill,
            name: name.to_string(),
            description: None,
            content: Some(content.to_string()),
            config: None,
        }
    }

    fn memory(name: &str, content: &str) -> Component {
        Component {
            kind: ComponentKind::Memory,
            name: name.to_string(),
            description: None,
            content: Some(content.to_string()),
            config: None,
        }
    }

    fn tool(name: &str, config: Option<serde_json::Value>) -> Component {
        Component {
            kind: ComponentKind::Tool,
            name: name.to_string(),
            description: Some(format!("{} tool", name)),
            content: None,
            config,
        }
    }

    const MODEL: &str = "claude-sonnet-4-5-20250929";

    #[test]
    fn test_compile_is_deterministic() {
        let components = vec![
            skill("greet", "Say hello."),
            memory("notes", "Background."),
            tool("lookup", Some(json!({"input_schema": {"type": "object"}}))),
        ];

        let a = compile(&components, MODEL).to_json().unwrap();
        let b = compile(&components, MODEL).to_json().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_skill_becomes_titled_section() {
        let manifest = compile(&[skill("greet", "Say hello.")], MODEL);

        assert!(manifest.instructions.starts_with(PREAMBLE));
        assert!(manifest.instructions.contains("# Your Skills"));
        assert!(manifest.instructions.contains("## greet"));
        assert!(manifest.instructions.contains("Say hello."));
        assert_eq!(manifest.skills, vec!["greet".to_string()]);
    }

    #[test]
    fn test_long_memory_is_truncated_with_marker() {
        let body = "x".repeat(5_000);
        let manifest = compile(&[skill("greet", "Say hello."), memory("context", &body)], MODEL);

        let expected = format!("{}{}", "x".repeat(MEMORY_SECTION_LIMIT), TRUNCATION_MARKER);
        assert!(manifest.instructions.contains(&expected));
        assert!(!manifest.instructions.contains(&"x".repeat(MEMORY_SECTION_LIMIT + 1)));
        // the manifest's memory list keeps the full body
        assert_eq!(manifest.memory[0].content.len(), 5_000);
    }

    #[test]
    fn test_short_memory_is_untouched() {
        let manifest = compile(&[memory("notes", "short body")], MODEL);

        assert!(manifest.instructions.contains("## notes"));
        assert!(manifest.instructions.contains("short body"));
        assert!(!manifest.instructions.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_claude_md_memory_titled_as_project_context() {
        let manifest = compile(&[memory("CLAUDE.md", "repo conventions")], MODEL);

        assert!(manifest.instructions.contains("## Project Context"));
        assert!(!manifest.instructions.contains("## CLAUDE.md"));
    }

    #[test]
    fn test_embedded_tool_list_used_verbatim() {
        let expanded = json!({
            "tools": [
                {"name": "search", "description": "search things", "input_schema": {"type": "object"}},
                {"name": "fetch", "description": "fetch things", "input_schema": {"type": "object"}}
            ]
        });
        let manifest = compile(&[tool("bundle", Some(expanded.clone()))], MODEL);

        assert_eq!(manifest.tools.len(), 2);
        assert_eq!(manifest.tools[0], expanded["tools"][0]);
    }

    #[test]
    fn test_tool_synthesized_from_component_fields() {
        let manifest = compile(
            &[tool("lookup", Some(json!({"input_schema": {"type": "object", "properties": {"q": {"type": "string"}}}})))],
            MODEL,
        );

        assert_eq!(manifest.tools.len(), 1);
        assert_eq!(manifest.tools[0]["name"], "lookup");
        assert_eq!(manifest.tools[0]["description"], "lookup tool");
        assert_eq!(manifest.tools[0]["input_schema"]["properties"]["q"]["type"], "string");
    }

    #[test]
    fn test_tool_without_config_defaults_to_empty_schema() {
        let manifest = compile(&[tool("bare", None)], MODEL);

        assert_eq!(manifest.tools.len(), 1);
        assert_eq!(manifest.tools[0]["input_schema"], empty_schema());
    }

    #[test]
    fn test_malformed_tool_config_degrades_to_noop() {
        let components = vec![
            tool("broken", Some(json!("not an object"))),
            tool("bad-list", Some(json!({"tools": "not an array"}))),
        ];
        let manifest = compile(&components, MODEL);

        assert_eq!(manifest.tools.len(), 2);
        for definition in &manifest.tools {
            assert_eq!(definition["input_schema"], empty_schema());
            assert!(definition["description"]
                .as_str()
                .unwrap()
                .contains("unavailable"));
        }
    }

    #[test]
    fn test_empty_component_set() {
        let manifest = compile(&[], MODEL);

        assert!(manifest.instructions.starts_with(PREAMBLE));
        assert!(manifest.tools.is_empty());
        assert!(manifest.memory.is_empty());
        assert!(manifest.skills.is_empty());
        assert_eq!(manifest.model, MODEL);
    }
}
