//! A bounded set of engine subprocesses, classified by role, handed out to
//! games and reclaimed (with automatic respawn on death) when released.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use engine_adapter::{EngineCapabilityProfile, EngineProcessAdapter, Transport};
use tokio::sync::{Mutex, Notify};

/// Which slot in the game a borrowed engine is filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineRole {
    Main,
    Opening,
    Ending,
    ResignCheck,
}

/// Everything needed to spawn one more instance of a role's engine.
#[derive(Debug, Clone)]
pub struct EngineSpec {
    pub program: String,
    pub args: Vec<String>,
    pub transport: Transport,
}

/// An idle adapter paired with the capability profile discovered for it at
/// spawn time, so a caller acquiring it can feed the Clock Translator
/// without re-running the handshake.
pub struct PooledEngine {
    pub adapter: EngineProcessAdapter,
    pub capabilities: EngineCapabilityProfile,
}

struct RolePool {
    idle: Arc<Mutex<VecDeque<PooledEngine>>>,
    notify: Arc<Notify>,
    spec: EngineSpec,
}

/// The live set of per-role engine pools. `build` spawns and handshakes
/// every configured instance before returning, which is this crate's
/// rendering of the component design's `ready` contract: by the time a pool
/// exists, it is already ready.
pub struct EnginePool {
    roles: HashMap<EngineRole, RolePool>,
}

async fn spawn_and_handshake(
    spec: &EngineSpec,
) -> Result<(EngineProcessAdapter, EngineCapabilityProfile), engine_adapter::Error> {
    let (adapter, mut stderr_rx) = EngineProcessAdapter::spawn(&spec.program, &spec.args, spec.transport)
        .map_err(engine_adapter::Error::TransportError)?;
    // stderr diagnostics before the capability handshake completes are
    // logged rather than routed anywhere, since no game owns this adapter
    // yet.
    tokio::spawn(async move { while stderr_rx.recv().await.is_some() {} });

    let list_commands_body = adapter.command("list_commands").await?;
    let commands = engine_adapter::capabilities::parse_command_list(&list_commands_body);

    let kata_systems = if commands.iter().any(|c| c == "kata-time_settings") {
        match adapter.command("kata-list_time_settings").await {
            Ok(body) => Some(engine_adapter::capabilities::parse_command_list(&body)),
            Err(_) => None,
        }
    } else {
        None
    };

    let profile = engine_adapter::capabilities::discover(&commands, kata_systems.as_deref());
    Ok((adapter, profile))
}

impl EnginePool {
    pub async fn build(specs: HashMap<EngineRole, (EngineSpec, u32)>) -> Result<Self, engine_adapter::Error> {
        let mut roles = HashMap::new();
        for (role, (spec, instances)) in specs {
            let mut idle = VecDeque::new();
            for _ in 0..instances {
                let (adapter, capabilities) = spawn_and_handshake(&spec).await?;
                idle.push_back(PooledEngine { adapter, capabilities });
            }
            roles.insert(
                role,
                RolePool { idle: Arc::new(Mutex::new(idle)), notify: Arc::new(Notify::new()), spec },
            );
        }
        Ok(Self { roles })
    }

    /// Number of idle, ready instances for `role`.
    pub async fn count_available(&self, role: EngineRole) -> usize {
        match self.roles.get(&role) {
            Some(pool) => pool.idle.lock().await.len(),
            None => 0,
        }
    }

    /// Borrows an idle instance, waiting for one to free up if none are
    /// available. Returns `None` if `role` was never configured.
    pub async fn acquire(&self, role: EngineRole) -> Option<PooledEngine> {
        let pool = self.roles.get(&role)?;
        loop {
            if let Some(engine) = pool.idle.lock().await.pop_front() {
                return Some(engine);
            }
            pool.notify.notified().await;
        }
    }

    /// Returns a borrowed instance. A dead instance triggers a detached
    /// respawn so the pool's capacity is restored without blocking the
    /// releasing caller.
    pub async fn release(&self, role: EngineRole, engine: PooledEngine) {
        let Some(pool) = self.roles.get(&role) else { return };
        if engine.adapter.state().is_dead() {
            let idle = pool.idle.clone();
            let notify = pool.notify.clone();
            let spec = pool.spec.clone();
            tokio::spawn(async move {
                match spawn_and_handshake(&spec).await {
                    Ok((adapter, capabilities)) => {
                        idle.lock().await.push_back(PooledEngine { adapter, capabilities });
                        notify.notify_one();
                    }
                    Err(err) => {
                        tracing::error!(?err, "failed to respawn dead engine");
                    }
                }
            });
        } else {
            pool.idle.lock().await.push_back(engine);
            pool.notify.notify_one();
        }
    }
}
