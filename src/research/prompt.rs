//! Prompt template and conversation assembly for query synthesis.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::completion::join_observations;
use crate::providers::{CompletionRequest, Message};

/// System prompt for query synthesis. `{{TOPIC}}` is the only placeholder.
pub const SEARCH_SYSTEM_PROMPT: &str = "
You are a world expert at searching the web to find facts on a given research topic.

Now for the given topic, along with the facts we've already gathered, an overall research plan, and observations from previous research done, develop a world-class Bing search query that will uncover new facts to complete our research. Make sure your query is tailored to the Bing search engine.

You don't need to create a search query for the whole plan, Just focus on creating a search query for the next part of the plan.

Here is your topic:

{{TOPIC}}

Now begin! Write your Bing query below. Respond with just the search query.
";

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").ok());

/// Substitute `{{NAME}}` / `{{ NAME }}` placeholders from `vars`.
///
/// Unknown names render as empty strings. Substituted values are not
/// re-scanned, so a value containing `{{...}}` is inserted verbatim.
pub fn render_template(template: &str, vars: &HashMap<&str, &str>) -> String {
    let Some(regex) = PLACEHOLDER.as_ref() else {
        return template.to_owned();
    };
    regex
        .replace_all(template, |caps: &Captures<'_>| {
            caps.get(1)
                .and_then(|name| vars.get(name.as_str()))
                .copied()
                .unwrap_or_default()
                .to_owned()
        })
        .into_owned()
}

/// Build the five-message conversation for one research step.
///
/// Order is fixed: system prompt, user topic, then assistant turns for the
/// plan, the facts and the observations.
pub fn build_conversation(
    model: &str,
    topic: &str,
    plan: &str,
    facts: &str,
    observations: &[String],
) -> CompletionRequest {
    let vars = HashMap::from([("TOPIC", topic)]);
    let system = render_template(SEARCH_SYSTEM_PROMPT, &vars);
    let all_observations = join_observations(observations);

    CompletionRequest {
        model: model.to_owned(),
        messages: vec![
            Message::system(system),
            Message::user(format!("Topic: {topic}")),
            Message::assistant(format!("Plan: {plan}")),
            Message::assistant(format!(
                "Here is the up-to-date list of facts that you know:: \n```{facts}\n```\n"
            )),
            Message::assistant(format!("Observations: \n```{all_observations}\n```\n")),
        ],
    }
}
