//! Activity subtree expansion.

use std::collections::BTreeSet;

use orgdir_core::error::DirectoryResult;
use orgdir_core::repository::ActivityRepository;
use tracing::{debug, warn};
use uuid::Uuid;

/// Resolves the set of activities below a root by walking parent → children.
pub struct ActivityTreeResolver<'a, A: ActivityRepository> {
    activities: &'a A,
}

impl<'a, A: ActivityRepository> ActivityTreeResolver<'a, A> {
    pub fn new(activities: &'a A) -> Self {
        Self { activities }
    }

    /// Ids of `root` and all of its transitive descendants.
    ///
    /// The walk is depth-first with an explicit stack. Each id is expanded
    /// at most once, so a cycle in stored data truncates the walk instead
    /// of looping. A root that does not exist yields `{root}`.
    pub async fn descendant_ids(&self, root: Uuid) -> DirectoryResult<BTreeSet<Uuid>> {
        let mut visited = BTreeSet::from([root]);
        let mut stack = vec![root];

        while let Some(current) = stack.pop() {
            for child in self.activities.get_children(current).await? {
                if visited.insert(child.id) {
                    stack.push(child.id);
                } else {
                    warn!(
                        activity_id = %child.id,
                        parent_id = %current,
                        "Activity reached twice while expanding subtree; skipping"
                    );
                }
            }
        }

        debug!(root = %root, size = visited.len(), "Activity subtree resolved");
        Ok(visited)
    }
}
