use std::collections::HashMap;

use crate::error::{PaymatchError, Result};
use crate::models::Client;

/// Two-level client grouping: top-level clients and their sub-clients.
#[derive(Debug, Default)]
pub struct ClientTree {
    clients: HashMap<i64, Client>,
    roots: Vec<i64>,
    children: HashMap<i64, Vec<i64>>,
}

impl ClientTree {
    /// Build the tree once per run. A parent that is itself a sub-client is
    /// rejected here instead of being resolved later.
    pub fn build(clients: &[Client]) -> Result<Self> {
        let by_id: HashMap<i64, Client> = clients.iter().map(|c| (c.id, c.clone())).collect();
        let mut roots = Vec::new();
        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();

        for client in clients {
            match client.parent_id {
                None => roots.push(client.id),
                Some(parent_id) if parent_id == client.id => {
                    return Err(PaymatchError::SelfParent(client.id));
                }
                Some(parent_id) => {
                    let parent = by_id.get(&parent_id).ok_or(PaymatchError::UnknownParent {
                        client_id: client.id,
                        parent_id,
                    })?;
                    if parent.parent_id.is_some() {
                        return Err(PaymatchError::HierarchyTooDeep {
                            client_id: client.id,
                            parent_id,
                        });
                    }
                    children.entry(parent_id).or_default().push(client.id);
                }
            }
        }

        Ok(Self {
            clients: by_id,
            roots,
            children,
        })
    }

    pub fn get(&self, id: i64) -> Option<&Client> {
        self.clients.get(&id)
    }

    /// Id of the top-level client this client belongs to.
    pub fn root_id(&self, id: i64) -> Option<i64> {
        self.get(id).map(|c| c.parent_id.unwrap_or(c.id))
    }

    /// Name a deposit for this client's group would be paid under.
    pub fn display_name(&self, id: i64) -> Option<&str> {
        let root = self.root_id(id)?;
        self.get(root).map(|c| c.name.as_str())
    }

    pub fn roots(&self) -> impl Iterator<Item = &Client> {
        self.roots.iter().filter_map(|id| self.clients.get(id))
    }

    pub fn children(&self, root_id: i64) -> impl Iterator<Item = &Client> {
        self.children
            .get(&root_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.clients.get(id))
    }
}
