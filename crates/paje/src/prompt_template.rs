use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tera::{Context, Error as TeraError, Tera};

/// The persona prompt shipped with the crate
pub const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

pub fn load_prompt_file<T: Serialize>(
    template_file: impl Into<PathBuf>,
    context_data: &T,
) -> Result<String, TeraError> {
    let template_content = fs::read_to_string(template_file.into())
        .map_err(|e| TeraError::chain("Failed to read template file", e))?;
    load_prompt(&template_content, context_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tool::Tool;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_load_prompt() {
        let template = "Saudações, {{ name }}! Use {{ tool }}.";
        let mut context = HashMap::new();
        context.insert("name".to_string(), "filho da terra".to_string());
        context.insert("tool".to_string(), "search_pdf".to_string());

        let result = load_prompt(template, &context).unwrap();
        assert_eq!(result, "Saudações, filho da terra! Use search_pdf.");
    }

    #[test]
    fn test_load_prompt_missing_variable() {
        let template = "Saudações, {{ name }}! Use {{ tool }}.";
        let mut context = HashMap::new();
        context.insert("name".to_string(), "irmã".to_string());
        // 'tool' is missing from context
        let result = load_prompt(template, &context);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_prompt_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("persona.md");
        fs::write(&file_path, "Você é {{ name }}.").unwrap();

        let mut context = HashMap::new();
        context.insert("name".to_string(), "um curandeiro".to_string());

        let result = load_prompt_file(file_path, &context).unwrap();
        assert_eq!(result, "Você é um curandeiro.");
    }

    #[test]
    fn test_load_prompt_file_missing_file() {
        let file_path = PathBuf::from("non_existent_template.md");
        let context: HashMap<String, String> = HashMap::new();

        let result = load_prompt_file(file_path, &context);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_prompt_with_tools() {
        let template = "### Ferramentas\n{% for tool in tools %}\n{{tool.name}}: {{tool.description}}{% endfor %}";

        let tools = vec![Tool::new(
            "search_pdf",
            "Busca no documento",
            json!({"type": "object", "properties": {"query": {"type": "string"}}}),
        )];

        let mut context = HashMap::new();
        context.insert("tools".to_string(), tools);

        let result = load_prompt(template, &context).unwrap();
        assert_eq!(result, "### Ferramentas\n\nsearch_pdf: Busca no documento");
    }
}
