//! Fixed prompt templates for the generation services

use gardener_core::Project;

/// Brainstorm a new project; expects a `{project_name, folder_name,
/// description}` payload somewhere in the reply.
pub fn idea_prompt() -> String {
    "Generate a unique, intermediate-level Python project idea. \
     It should be a valid, real-world tool or utility. \
     Return JSON: {project_name, folder_name, description}"
        .to_string()
}

/// Propose the next file for the current project; expects a `{filename,
/// description, code_prompt}` payload.
pub fn next_file_prompt(project: &Project) -> String {
    format!(
        "Project: {}\nDescription: {}\nExisting Files: {}\n\
         Suggest the next necessary Python file for this project. \
         Return JSON: {{filename, description, code_prompt}}",
        project.name,
        project.description,
        project.files.join(", ")
    )
}

/// Produce the code for one proposed file
pub fn code_prompt(filename: &str, project: &Project, requirement: &str) -> String {
    format!(
        "Write complete Python code for '{}'.\nContext: {}\nRequirement: {}\n\
         Return ONLY code.",
        filename, project.description, requirement
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        let mut project = Project {
            name: "Log Parser".to_string(),
            folder: "20260831_LogParser".to_string(),
            description: "Parses logs".to_string(),
            files: Vec::new(),
            file_count: 0,
        };
        project.record_file("parser.py");
        project.record_file("cli.py");
        project
    }

    #[test]
    fn test_next_file_prompt_carries_context() {
        let prompt = next_file_prompt(&project());
        assert!(prompt.contains("Log Parser"));
        assert!(prompt.contains("Parses logs"));
        assert!(prompt.contains("parser.py, cli.py"));
        assert!(prompt.contains("{filename, description, code_prompt}"));
    }

    #[test]
    fn test_code_prompt_names_the_file() {
        let prompt = code_prompt("report.py", &project(), "Render a summary");
        assert!(prompt.contains("'report.py'"));
        assert!(prompt.contains("Render a summary"));
        assert!(prompt.contains("Return ONLY code."));
    }
}
