//! Agent runner: streaming chat completions with a tool calling loop.

use super::tools::{parse_tool_call, ToolContext};
use super::{AgentChunk, AgentStream, ChatAgent};
use crate::error::{Result, SiftError};
use crate::llm::LlmClient;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionMessageToolCallChunk,
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionToolType, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, FunctionCall,
};
use async_stream::try_stream;
use futures::{Stream, StreamExt};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Agent bound to one model, system prompt and toolset.
#[derive(Clone)]
pub struct Agent {
    client: LlmClient,
    model: String,
    temperature: f32,
    system_prompt: String,
    tools: ToolContext,
    max_iterations: usize,
}

impl Agent {
    /// Create a new agent.
    pub fn new(client: LlmClient, model: &str, system_prompt: String, tools: ToolContext) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature: 0.0,
            system_prompt,
            tools,
            max_iterations: 10,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// The rendered system prompt.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn initial_messages(&self, message: &str) -> Result<Vec<ChatCompletionRequestMessage>> {
        Ok(vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt.clone())
                .build()
                .map_err(|e| SiftError::Agent(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(message)
                .build()
                .map_err(|e| SiftError::Agent(e.to_string()))?
                .into(),
        ])
    }

    fn build_request(
        &self,
        messages: &[ChatCompletionRequestMessage],
    ) -> Result<CreateChatCompletionRequest> {
        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages.to_vec())
            .tools(self.tools.definitions())
            .temperature(self.temperature)
            .stream(true)
            .build()
            .map_err(|e| SiftError::Agent(e.to_string()))
    }

    /// Execute a single tool call, rendering failures as text for the model.
    async fn execute_tool_call(&self, tool_call: &ChatCompletionMessageToolCall) -> String {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("Agent calling tool: {} with args: {}", name, arguments);

        match parse_tool_call(name, arguments) {
            Ok(tool) => match self.tools.execute(&tool).await {
                Ok(output) => output,
                Err(e) => format!("Tool error: {}", e),
            },
            Err(e) => format!("Failed to parse tool call: {}", e),
        }
    }
}

impl ChatAgent for Agent {
    fn run_stream(&self, message: &str) -> AgentStream {
        Box::pin(turn_stream(self.clone(), message.to_string()))
    }
}

fn check_iterations(iterations: usize, max: usize) -> Result<()> {
    if iterations > max {
        return Err(SiftError::Agent(format!(
            "Agent exceeded maximum iterations ({})",
            max
        )));
    }
    Ok(())
}

fn turn_stream(agent: Agent, message: String) -> impl Stream<Item = Result<AgentChunk>> + Send {
    try_stream! {
        let mut messages = agent.initial_messages(&message)?;
        let mut iterations = 0;

        loop {
            iterations += 1;
            check_iterations(iterations, agent.max_iterations)?;
            debug!("Agent iteration {}", iterations);

            let request = agent.build_request(&messages)?;
            let mut response = agent
                .client
                .chat()
                .create_stream(request)
                .await
                .map_err(|e| SiftError::Llm(e.to_string()))?;

            let mut content = String::new();
            let mut pending = PendingToolCalls::default();

            while let Some(chunk) = response.next().await {
                let chunk = chunk.map_err(|e| SiftError::Llm(e.to_string()))?;
                for choice in chunk.choices {
                    if let Some(text) = choice.delta.content {
                        if !text.is_empty() {
                            content.push_str(&text);
                            yield AgentChunk::Content { content: Some(text) };
                        }
                    }
                    if let Some(calls) = choice.delta.tool_calls {
                        pending.absorb(calls);
                    }
                }
            }

            let tool_calls = pending.finish();
            if tool_calls.is_empty() {
                debug!("Agent finished after {} iteration(s)", iterations);
                break;
            }

            let mut assistant = ChatCompletionRequestAssistantMessageArgs::default();
            assistant.tool_calls(tool_calls.clone());
            if !content.is_empty() {
                assistant.content(content);
            }
            messages.push(
                assistant
                    .build()
                    .map_err(|e| SiftError::Agent(e.to_string()))?
                    .into(),
            );

            for tool_call in &tool_calls {
                let name = tool_call.function.name.clone();
                yield AgentChunk::ToolCall { name: name.clone() };

                let result = agent.execute_tool_call(tool_call).await;
                messages.push(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(&tool_call.id)
                        .content(result)
                        .build()
                        .map_err(|e| SiftError::Agent(e.to_string()))?
                        .into(),
                );

                yield AgentChunk::ToolResult { name };
            }
        }
    }
}

#[derive(Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Tool calls assembled from streamed fragments, keyed by call index.
#[derive(Default)]
struct PendingToolCalls {
    calls: BTreeMap<u32, PartialToolCall>,
}

impl PendingToolCalls {
    fn absorb(&mut self, chunks: Vec<ChatCompletionMessageToolCallChunk>) {
        for chunk in chunks {
            let call = self.calls.entry(chunk.index).or_default();
            if let Some(id) = chunk.id.filter(|id| !id.is_empty()) {
                call.id = id;
            }
            if let Some(function) = chunk.function {
                if let Some(name) = function.name.filter(|n| !n.is_empty()) {
                    call.name = name;
                }
                if let Some(arguments) = function.arguments {
                    call.arguments.push_str(&arguments);
                }
            }
        }
    }

    fn finish(self) -> Vec<ChatCompletionMessageToolCall> {
        self.calls
            .into_iter()
            .filter(|(_, call)| !call.name.is_empty())
            .map(|(index, call)| ChatCompletionMessageToolCall {
                id: if call.id.is_empty() {
                    format!("call_{}", index)
                } else {
                    call.id
                },
                r#type: ChatCompletionToolType::Function,
                function: FunctionCall {
                    name: call.name,
                    arguments: call.arguments,
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::types::FunctionCallStream;

    fn fragment(index: u32, id: Option<&str>, name: Option<&str>, args: &str) -> ChatCompletionMessageToolCallChunk {
        ChatCompletionMessageToolCallChunk {
            index,
            id: id.map(str::to_string),
            r#type: Some(ChatCompletionToolType::Function),
            function: Some(FunctionCallStream {
                name: name.map(str::to_string),
                arguments: Some(args.to_string()),
            }),
        }
    }

    #[test]
    fn test_pending_tool_calls_assemble_fragments() {
        let mut pending = PendingToolCalls::default();
        pending.absorb(vec![
            fragment(0, Some("call_a"), Some("duckduckgo_search"), "{\"qu"),
            fragment(1, Some("call_b"), Some("read_article"), ""),
        ]);
        pending.absorb(vec![
            fragment(0, None, None, "ery\": \"rust\"}"),
            fragment(1, None, None, "{\"url\": \"https://example.com\"}"),
        ]);

        let calls = pending.finish();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call_a");
        assert_eq!(calls[0].function.name, "duckduckgo_search");
        assert_eq!(calls[0].function.arguments, "{\"query\": \"rust\"}");
        assert_eq!(calls[1].function.name, "read_article");
    }

    #[test]
    fn test_pending_tool_calls_without_id() {
        let mut pending = PendingToolCalls::default();
        pending.absorb(vec![fragment(3, None, Some("get_time_info"), "{}")]);
        let calls = pending.finish();
        assert_eq!(calls[0].id, "call_3");
    }

    #[test]
    fn test_check_iterations() {
        assert!(check_iterations(10, 10).is_ok());
        assert!(matches!(check_iterations(11, 10), Err(SiftError::Agent(_))));
    }
}
