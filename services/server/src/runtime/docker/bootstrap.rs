//! Runtime bootstrap artifact
//!
//! The application baked into every agent image: a small HTTP server in
//! front of an execution loop that loads the compiled manifest once and
//! talks to the model inference API. Working memory entries are named and
//! last-write-wins; the effective system prompt is re-derived on every
//! turn, so injecting or clearing working memory changes future turns
//! without a redeploy.

/// Fixed application port inside the container
pub const RUNTIME_PORT: u16 = 8080;

const DOCKERFILE: &str = r##"FROM python:3.11-slim

WORKDIR /app

RUN pip install --no-cache-dir \
    anthropic \
    fastapi \
    "uvicorn[standard]" \
    websockets

COPY server.py agent.py ./
COPY config/ ./config/

EXPOSE 8080

HEALTHCHECK --interval=30s --timeout=5s --start-period=10s \
    CMD ["python", "-c", "import urllib.request; urllib.request.urlopen('http://127.0.0.1:8080/health', timeout=4)"]

CMD ["uvicorn", "server:app", "--host", "0.0.0.0", "--port", "8080"]
"##;

const SERVER_PY: &str = r##""""HTTP entry point for the agent runtime."""

import uuid
from typing import List, Optional

from fastapi import FastAPI, WebSocket, WebSocketDisconnect
from pydantic import BaseModel

from agent import AgentLoop

app = FastAPI(title="Agent Runtime")
loop = AgentLoop()


class ChatRequest(BaseModel):
    message: str
    conversation_id: Optional[str] = None


class ChatResponse(BaseModel):
    response: str
    conversation_id: str


class InjectRequest(BaseModel):
    content: str
    name: Optional[str] = None


class MemoryEntry(BaseModel):
    name: str
    content: str


class MemoryState(BaseModel):
    success: bool
    entries: List[MemoryEntry]
    message: str


def memory_state(message: str) -> MemoryState:
    entries = [MemoryEntry(name=e["name"], content=e["content"]) for e in loop.working_memory()]
    return MemoryState(success=True, entries=entries, message=message)


@app.get("/health")
async def health():
    return {"status": "healthy"}


@app.get("/config")
async def config():
    return loop.summary()


@app.post("/chat", response_model=ChatResponse)
async def chat(request: ChatRequest):
    conversation_id = request.conversation_id or str(uuid.uuid4())
    reply = await loop.chat(request.message, conversation_id)
    return ChatResponse(response=reply, conversation_id=conversation_id)


@app.get("/working-memory", response_model=MemoryState)
async def list_working_memory():
    entries = loop.working_memory()
    return memory_state(f"{len(entries)} entries in working memory")


@app.post("/inject-context", response_model=MemoryState)
async def inject_context(request: InjectRequest):
    name = request.name or f"injected_{uuid.uuid4().hex[:8]}"
    loop.inject(name, request.content)
    return memory_state(f"Injected '{name}' into working memory")


@app.delete("/working-memory", response_model=MemoryState)
async def clear_working_memory():
    loop.clear()
    return memory_state("Working memory cleared")


@app.websocket("/ws")
async def chat_stream(websocket: WebSocket):
    await websocket.accept()
    conversation_id = None
    try:
        while True:
            data = await websocket.receive_json()
            message = data.get("message", "")
            conversation_id = data.get("conversation_id") or conversation_id or str(uuid.uuid4())
            async for chunk in loop.stream(message, conversation_id):
                await websocket.send_json({
                    "type": "chunk",
                    "content": chunk,
                    "conversation_id": conversation_id,
                })
            await websocket.send_json({
                "type": "done",
                "conversation_id": conversation_id,
            })
    except WebSocketDisconnect:
        pass
"##;

const AGENT_PY: &str = r##""""Agent execution loop backed by the Anthropic API."""

import json
import os
from pathlib import Path
from typing import AsyncIterator

import anthropic

MANIFEST_PATH = Path("/app/config/agent.json")
MAX_TOKENS = 4096


class AgentLoop:
    """Runs the compiled agent configuration."""

    def __init__(self):
        manifest = json.loads(MANIFEST_PATH.read_text())
        self.instructions = manifest.get("instructions", "You are a helpful assistant.")
        self.tools = manifest.get("tools", [])
        self.memory = manifest.get("memory", [])
        self.skills = manifest.get("skills", [])
        self.model = manifest.get("model", "claude-sonnet-4-5-20250929")
        self.conversations: dict[str, list] = {}
        self._working_memory: list[dict] = []
        self.client = anthropic.Anthropic(api_key=os.environ.get("ANTHROPIC_API_KEY"))

    def summary(self) -> dict:
        return {
            "model": self.model,
            "skill_count": len(self.skills),
            "tool_count": len(self.tools),
            "memory_count": len(self.memory),
            "working_memory_count": len(self._working_memory),
        }

    def working_memory(self) -> list[dict]:
        return self._working_memory

    def inject(self, name: str, content: str) -> None:
        self._working_memory = [e for e in self._working_memory if e["name"] != name]
        self._working_memory.append({"name": name, "content": content})
        self.conversations.clear()

    def clear(self) -> None:
        self._working_memory = []
        self.conversations.clear()

    def _system_prompt(self) -> str:
        if not self._working_memory:
            return self.instructions
        parts = [self.instructions, "\n\n## Working Memory (Injected Context)\n"]
        for entry in self._working_memory:
            parts.append(f"\n### {entry['name']}\n{entry['content']}\n")
        return "".join(parts)

    async def chat(self, message: str, conversation_id: str) -> str:
        history = self.conversations.get(conversation_id, [])
        messages = history + [{"role": "user", "content": message}]
        response = self.client.messages.create(
            model=self.model,
            max_tokens=MAX_TOKENS,
            system=self._system_prompt(),
            messages=messages,
        )
        reply = response.content[0].text
        self.conversations[conversation_id] = messages + [
            {"role": "assistant", "content": reply}
        ]
        return reply

    async def stream(self, message: str, conversation_id: str) -> AsyncIterator[str]:
        history = self.conversations.get(conversation_id, [])
        messages = history + [{"role": "user", "content": message}]
        reply = ""
        with self.client.messages.stream(
            model=self.model,
            max_tokens=MAX_TOKENS,
            system=self._system_prompt(),
            messages=messages,
        ) as stream:
            for text in stream.text_stream:
                reply += text
                yield text
        self.conversations[conversation_id] = messages + [
            {"role": "assistant", "content": reply}
        ]
"##;

/// Assemble the in-memory tar build context: bootstrap sources plus the
/// serialized manifest at config/agent.json.
pub fn build_context(manifest_json: &str) -> std::io::Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());

    append_file(&mut builder, "Dockerfile", DOCKERFILE.as_bytes())?;
    append_file(&mut builder, "server.py", SERVER_PY.as_bytes())?;
    append_file(&mut builder, "agent.py", AGENT_PY.as_bytes())?;
    append_file(&mut builder, "config/agent.json", manifest_json.as_bytes())?;

    builder.into_inner()
}

fn append_file(
    builder: &mut tar::Builder<Vec<u8>>,
    path: &str,
    data: &[u8],
) -> std::io::Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    // fixed mtime keeps the context byte-stable for identical manifests
    header.set_mtime(0);
    header.set_cksum();
    builder.append_data(&mut header, path, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_context_contains_all_entries() {
        let context = build_context("{\"model\": \"test\"}").unwrap();
        let mut archive = tar::Archive::new(context.as_slice());

        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["Dockerfile", "server.py", "agent.py", "config/agent.json"]
        );
    }

    #[test]
    fn test_build_context_is_reproducible() {
        let a = build_context("{}").unwrap();
        let b = build_context("{}").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_manifest_lands_in_config_entry() {
        use std::io::Read;

        let manifest_json = "{\"instructions\": \"hi\"}";
        let context = build_context(manifest_json).unwrap();
        let mut archive = tar::Archive::new(context.as_slice());

        let mut found = None;
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            if entry.path().unwrap().to_string_lossy() == "config/agent.json" {
                let mut content = String::new();
                entry.read_to_string(&mut content).unwrap();
                found = Some(content);
            }
        }
        assert_eq!(found.as_deref(), Some(manifest_json));
    }
}
