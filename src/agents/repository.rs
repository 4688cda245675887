//! Agent storage.

use async_trait::async_trait;
use dashmap::DashMap;

use super::Agent;

/// Storage capability for agents.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    async fn get(&self, id: &str) -> Option<Agent>;

    /// All agents, oldest first.
    async fn list(&self) -> Vec<Agent>;

    /// Insert or replace by `id`.
    async fn put(&self, agent: Agent);

    /// Remove by `id`, returning the removed agent.
    async fn delete(&self, id: &str) -> Option<Agent>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryAgentRepository {
    agents: DashMap<String, Agent>,
}

impl InMemoryAgentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentRepository for InMemoryAgentRepository {
    async fn get(&self, id: &str) -> Option<Agent> {
        self.agents.get(id).map(|entry| entry.value().clone())
    }

    async fn list(&self) -> Vec<Agent> {
        let mut agents: Vec<Agent> = self
            .agents
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        agents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        agents
    }

    async fn put(&self, agent: Agent) {
        self.agents.insert(agent.id.clone(), agent);
    }

    async fn delete(&self, id: &str) -> Option<Agent> {
        self.agents.remove(id).map(|(_, agent)| agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::NewAgent;

    fn agent(name: &str) -> Agent {
        NewAgent {
            name: Some(name.into()),
            provider: Some("mindrx".into()),
            model: Some("qwen2:0.5b".into()),
            system_prompt: Some("Hi.".into()),
            ..Default::default()
        }
        .into_agent()
        .unwrap()
    }

    #[tokio::test]
    async fn test_crud() {
        let repo = InMemoryAgentRepository::new();
        let a = agent("a");
        let b = agent("b");
        repo.put(a.clone()).await;
        repo.put(b.clone()).await;

        assert_eq!(repo.get(&a.id).await, Some(a.clone()));
        assert_eq!(repo.list().await.len(), 2);

        let mut renamed = a.clone();
        renamed.name = "a2".into();
        repo.put(renamed).await;
        assert_eq!(repo.get(&a.id).await.unwrap().name, "a2");
        assert_eq!(repo.list().await.len(), 2);

        assert!(repo.delete(&a.id).await.is_some());
        assert!(repo.delete(&a.id).await.is_none());
        assert_eq!(repo.list().await, vec![b]);
    }

    #[tokio::test]
    async fn test_missing_id() {
        let repo = InMemoryAgentRepository::new();
        assert!(repo.get("agent_missing").await.is_none());
    }
}
