//! Document processing pipeline built with the chaining builder
//!
//! Validates a document, processes and summarizes it, then saves the
//! results. Invalid documents are routed to an error handler instead.
//!
//! Run with `RUST_LOG=debug` to see every builder call.

use graph_fluent::{
    create_workflow, ChannelType, CompileOptions, EdgeTarget, Node, State, StateSchema,
    StateUpdate, END,
};
use serde_json::json;

fn validate_document(state: &State) -> StateUpdate {
    let valid = state
        .get_str("document")
        .is_some_and(|text| !text.trim().is_empty());

    let mut update = StateUpdate::new();
    update.insert("valid".to_string(), json!(valid));
    update
}

fn process_content(state: &State) -> StateUpdate {
    let processed = state
        .get_str("document")
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let mut update = StateUpdate::new();
    update.insert("processed".to_string(), json!(processed));
    update
}

fn generate_summary(state: &State) -> StateUpdate {
    let words = state
        .get_str("processed")
        .map(|text| text.split(' ').count())
        .unwrap_or(0);

    let mut update = StateUpdate::new();
    update.insert("summary".to_string(), json!(format!("{} word(s)", words)));
    update
}

fn save_results(_: &State) -> StateUpdate {
    let mut update = StateUpdate::new();
    update.insert("saved".to_string(), json!(true));
    update
}

fn handle_error(_: &State) -> StateUpdate {
    let mut update = StateUpdate::new();
    update.insert("error".to_string(), json!("document is empty"));
    update
}

fn route_validation(state: &State) -> String {
    if state.get_bool("valid").unwrap_or(false) {
        "valid".to_string()
    } else {
        "invalid".to_string()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let schema = StateSchema::new("DocumentPipeline")
        .channel("document", ChannelType::String)
        .channel("valid", ChannelType::Boolean)
        .channel("processed", ChannelType::String)
        .channel("summary", ChannelType::String)
        .channel("saved", ChannelType::Boolean)
        .channel("error", ChannelType::Json);
    let workflow = create_workflow(schema);

    let validate = workflow.register(&Node::new("validate").bind(validate_document))?;
    let process = workflow.register(&Node::new("process").bind(process_content))?;
    let summarize = workflow.register(&Node::new("summarize").bind(generate_summary))?;
    let save = workflow.register(&Node::new("save").bind(save_results))?;
    let error = workflow.register(&Node::new("error").bind(handle_error))?;

    workflow.add_conditional_edges(
        &validate,
        route_validation,
        [
            ("valid", EdgeTarget::from(&process)),
            ("invalid", EdgeTarget::from(&error)),
        ],
    )?;
    process
        .connect_to(&summarize)?
        .connect_to(&save)?
        .connect_to(END)?;
    error.connect_to("END")?;
    workflow.set_entry_point(&validate)?;

    log::info!("{}", workflow);
    let compiled = workflow.compile(CompileOptions::new().with_name("document-pipeline"))?;

    println!("{}", compiled.to_json()?);
    Ok(())
}
