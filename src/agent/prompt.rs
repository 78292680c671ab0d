//! Prompt templates and rendering for the agent loop.
//!
//! Templates use `{tools}`, `{tool_names}`, `{chat_history}`, `{input}` and
//! `{agent_scratchpad}` placeholders. Substitution is single-pass, so text
//! inserted for one placeholder is never re-expanded.

use super::parser::OBSERVATION_MARKER;
use super::types::IntermediateStep;
use super::DispatchStrategy;
use crate::tools::ToolRegistry;

const FORMAT_SEQUENTIAL: &str = r#"Use the following format:

Question: the input prompt from the user
Thought: consider what the user is asking and whether you already have enough information to answer. Only use a tool if you need data you do not have.
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action (a list of parts, models and related records)
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer based on the retrieved data
Final Answer: the final answer to the original input question"#;

const FORMAT_PARALLEL: &str = r#"Use the following format:

Question: the input prompt from the user
Thought: consider what the user is asking
Action: the action to take, should be one of [{tool_names}] (it runs the Query and Similarity Search tools in parallel)
Action Input: the search text, passed to both tools
Observation: the combined results from both tools
Thought: review the combined results
Final Answer: the final answer to the original input question"#;

const RULES_SEQUENTIAL: &str = r#"Rules to follow:

1. **Tool selection**: pick the tool that fits the question. For part compatibility start with the Query tool; if it does not settle the question, use Similarity Search for related information.
2. **Read the output**: the tools return lists of records describing parts, models and how they relate. If a result contains both the queried part and the model, the part is compatible with that model. Use installation or troubleshooting records to guide the user.
3. **Next steps**: if the output answers the question, write the final answer. If it is incomplete or ambiguous, choose another tool and repeat.
4. **Final answer**:
   - For compatibility questions, say whether the part is compatible based on the retrieved data.
   - For installation questions, give the relevant instructions.
   - For troubleshooting questions, give the steps to fix the issue.
   - Be concise and use the exact names and numbers from the tool output.
   - Never fabricate information; rely strictly on the data retrieved by the tools.
5. If you still cannot find the answer, ask the user for more context such as part numbers, model numbers or the exact symptom.

If the tools return no results, your final answer should be "I do not know" or "I do not have this answer.""#;

const RULES_PARALLEL: &str = r#"Rules to follow:

1. The Query and Similarity Search tools run together automatically. If their combined results answer the question, use them to write the final answer; if not, say the information is insufficient.
2. When the results fall short, ask the user for more context such as part numbers, model numbers or the exact symptom.
3. When writing the final answer:
   - For compatibility questions, say whether the part is compatible based on the combined results.
   - For installation questions, give the relevant instructions.
   - For troubleshooting questions, give the steps to fix the issue.
   - Be concise and use the exact names and numbers from the database.
   - Never fabricate information; rely strictly on the data retrieved by the tools.

If the combined tools return no useful results, your final answer should be "I do not know" or "I do not have this answer.""#;

const HISTORY_SECTION: &str = "Here is the conversation history so far:\n{chat_history}\n\n";

/// Pick the template for an agent's memory and dispatch settings.
pub fn template_for(memory: bool, strategy: DispatchStrategy) -> String {
    let (format, rules) = match strategy {
        DispatchStrategy::Sequential => (FORMAT_SEQUENTIAL, RULES_SEQUENTIAL),
        DispatchStrategy::Parallel => (FORMAT_PARALLEL, RULES_PARALLEL),
    };
    let history = if memory { HISTORY_SECTION } else { "" };

    format!(
        "Your goal is to answer the user's question about appliance parts and models as accurately as possible using the tools at your disposal. You have access to these tools:\n\n\
         {{tools}}\n\n\
         {history}\
         {format}\n\n\
         {rules}\n\n\
         User prompt:\n{{input}}\n\n\
         {{agent_scratchpad}}"
    )
}

/// One `name: description` line per tool.
pub fn render_tool_catalogue(tools: &ToolRegistry) -> String {
    tools
        .list_tools()
        .iter()
        .map(|t| format!("{}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replay previous steps so the model continues where it stopped.
pub fn render_scratchpad(steps: &[IntermediateStep]) -> String {
    let mut scratchpad = String::new();
    for step in steps {
        scratchpad.push_str(&step.action.log);
        scratchpad.push('\n');
        scratchpad.push_str(OBSERVATION_MARKER);
        scratchpad.push(' ');
        scratchpad.push_str(&step.observation);
        scratchpad.push_str("\nThought: ");
    }
    scratchpad
}

/// Fills a template from the current loop state.
#[derive(Debug, Clone)]
pub struct PromptRenderer {
    template: String,
}

impl PromptRenderer {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn render(
        &self,
        tools: &ToolRegistry,
        chat_history: &str,
        input: &str,
        steps: &[IntermediateStep],
    ) -> String {
        let catalogue = render_tool_catalogue(tools);
        let tool_names = tools.names().join(", ");
        let scratchpad = render_scratchpad(steps);

        substitute(&self.template, |name| match name {
            "tools" => Some(catalogue.as_str()),
            "tool_names" => Some(tool_names.as_str()),
            "chat_history" => Some(chat_history),
            "input" => Some(input),
            "agent_scratchpad" => Some(scratchpad.as_str()),
            _ => None,
        })
    }
}

/// Replace `{name}` tokens for which `value` returns text; leave the rest verbatim.
fn substitute<'a, F>(template: &str, value: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            value(name).map(|text| (text, close))
        });
        match replaced {
            Some((text, close)) => {
                out.push_str(text);
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
