//! Prompt templates for the demonstration and judgment oracles.

/// System prompt for validating an existing demo file.
pub const VALIDATION_SYSTEM_PROMPT: &str = "You review source files from research code repositories. \
Answer with a single word: YES or NO.";

/// User prompt for validating an existing demo file.
pub const VALIDATION_PROMPT: &str = r#"A research repository has the following structure:

{summary}

Candidate file: {path}
--------------------
{source}
--------------------

Is this file a self-contained, runnable demonstration of the project's primary functionality
that can be executed from the repository root without arguments, interactive input,
network downloads or GPUs?

Answer YES or NO only."#;

/// System prompt for generating a new demonstration script.
pub const GENERATION_SYSTEM_PROMPT: &str = "You write minimal runnable Python demonstration scripts for research code repositories. \
Output only raw Python source. No markdown, no code fences, no explanations.";

/// User prompt for generating a new demonstration script.
pub const GENERATION_PROMPT: &str = r#"Write a single Python script that demonstrates the primary functionality of this repository.

Repository structure:
{summary}

README excerpt:
--------------------
{readme}
--------------------

Requirements:
1. The script is saved as {file_name} in the repository root and run from there with no arguments.
2. Import the project's own modules using paths relative to the repository root.
3. Use small synthetic inputs; do not download data, train for long, or require a GPU.
4. Print a short, human-readable summary of what was computed.
5. Finish well within {timeout_secs} seconds.

Output ONLY the Python source."#;

/// System prompt for the qualitative judgment.
pub const JUDGMENT_SYSTEM_PROMPT: &str = "You are a code reviewer evaluating generated demo scripts for research software projects. \
Assess the quality, intent and potential of the generated code. Award generous partial credit when the \
structure and logic are sound even if execution failed for environment-specific reasons (missing packages, \
missing data files). Score on a scale of {min} to {max}, integer only. Output ONLY a single integer.";

/// User prompt for the qualitative judgment.
pub const JUDGMENT_PROMPT: &str = r#"Evaluate the generated demo script for the project summarized below. Focus on the quality of
the generated code itself, regardless of execution failures caused by the environment.

Project summary:
{summary}

Generated code:
--------------------
{source}
--------------------

Execution status: {status} (exit code {exit_code}, {elapsed}s)

Execution output (stdout):
--------------------
{stdout}
--------------------

Execution errors (stderr), use only to tell bad code from environment problems:
--------------------
{stderr}
--------------------

Criteria:
1. Relevance (2 points): does the code import and call the project's core modules or functions?
   2 if the right modules are used even if they failed to load; 1 if the code is valid but generic.
2. Clarity (2 points): is the logic clear, clean and professional?
   2 if clear; 1 if it reads like a raw notebook conversion but is sound.
3. Completeness (1 point): does it prepare placeholder data or perform the needed setup steps?

Output ONLY a single integer from {min} to {max}: the sum of the criteria."#;

/// Fills `{key}` placeholders in a template in a single pass, so substituted
/// values are never re-scanned for placeholders.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
