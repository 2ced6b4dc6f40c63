use serde::Deserialize;

use crate::catalog::{category_keys, Catalog};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBrief {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub project_types: Vec<String>,
}

impl ProjectBrief {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.description.trim().is_empty() {
            return Err("Please describe what you're planning to build.");
        }
        if self.experience_level.trim().is_empty() {
            return Err("Please select your experience level.");
        }
        Ok(())
    }
}

pub fn build_prompt(brief: &ProjectBrief, catalog: &Catalog) -> String {
    let description = brief.description.trim();
    let experience = brief.experience_level.trim();
    let project_types = if brief.project_types.is_empty() {
        "General development".to_string()
    } else {
        brief.project_types.join(", ")
    };
    let available_tools = catalog.names_list();
    let available_categories = category_keys().collect::<Vec<_>>().join(", ");

    format!(
        r#"You are an expert software development consultant. Based on the project description and experience level, recommend the BEST tools for this project.

PROJECT DETAILS:
- Description: {description}
- Experience Level: {experience}
- Project Types: {project_types}

AVAILABLE TOOLS TO CHOOSE FROM:
{available_tools}

AVAILABLE CATEGORIES (use these exact lowercase keys):
{available_categories}

CRITICAL INSTRUCTIONS:
1. Recommend 8-12 tools total across different categories
2. NEVER recommend the same tool in multiple categories
3. Each tool should appear only ONCE in the entire response
4. Consider the developer's experience level ({experience})
5. For tools from our directory: Use exact tool names and mark inDirectory: true
6. For external tools (not in our directory):
   - Use ONLY the tool name without any parentheses, versions, or extra text
   - Provide the official website URL
   - Keep descriptions concise and professional
7. Use ONLY the available category keys provided above
8. Provide specific reasons why each tool fits this project
9. IMPORTANT: Before marking any tool as external, check if a similar tool exists in our directory (e.g., "Tailwind" should match "Tailwind CSS")

RESPONSE FORMAT (EXAMPLE) - Follow this EXACT JSON structure:
{{
  "frontend": [
    {{"name": "React", "reason": "Perfect for building interactive UIs with component-based architecture", "inDirectory": true}}
  ],
  "backend": [
    {{"name": "Express", "reason": "Minimal web framework for Node.js applications", "inDirectory": true}}
  ],
  "database": [
    {{"name": "MongoDB", "reason": "Flexible NoSQL database for rapid development", "inDirectory": false, "url": "https://www.mongodb.com"}}
  ]
}}"#
    )
}
