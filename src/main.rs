//! Colony Core - demo runner
//!
//! Builds a small simulated colony (ten labs, a terminal, a storage, two
//! sources and a damaged road network) and runs it for a number of ticks.
//! Haulers are instantaneous and the resource network delivers everything
//! it is asked for, so the run shows the scheduling decisions only.

use clap::Parser;
use colony_core::agents::{Agent, AgentRegistry};
use colony_core::colony::Colony;
use colony_core::core::config::CoreConfig;
use colony_core::core::constants::REPAIR_POWER;
use colony_core::core::error::Result;
use colony_core::core::types::{AgentId, ObjectId, Position, Role, RoomCoord};
use colony_core::events::ColonyEvent;
use colony_core::logistics::network::RequestLog;
use colony_core::production::memory::MemoryStore;
use colony_core::production::planner::StockTargetPlanner;
use colony_core::stats::Stats;
use colony_core::tasks::TaskKind;
use colony_core::world::entity::{EntityKind, LabState};
use colony_core::world::resources::{BodyPart, ResourceType};
use colony_core::world::sim::SimWorld;
use colony_core::world::store::Store;
use colony_core::world::WorldView;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const COLONY: &str = "W1N1";

/// Run a simulated colony and report what it scheduled
#[derive(Parser, Debug)]
#[command(name = "colony-core")]
#[command(about = "Run a simulated colony through the scheduling core")]
struct Args {
    /// Ticks to simulate
    #[arg(long, default_value_t = 500)]
    ticks: u64,

    /// TOML config file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON memory file, loaded on start and saved on exit
    #[arg(long)]
    memory: Option<PathBuf>,

    /// Override the config's jitter seed
    #[arg(long)]
    seed: Option<u64>,
}

struct Demo {
    world: SimWorld,
    agents: AgentRegistry,
    terminal: ObjectId,
    booster: Option<AgentId>,
}

fn build_world() -> Demo {
    let mut world = SimWorld::new();
    let flower = [
        (10, 10),
        (11, 11),
        (9, 10),
        (10, 9),
        (11, 9),
        (12, 10),
        (12, 11),
        (12, 12),
        (11, 12),
        (10, 11),
    ];
    for (x, y) in flower {
        world.spawn(
            Position::new(x, y),
            EntityKind::Lab(LabState::default().with_energy(2000)),
        );
    }
    let terminal = world.spawn(
        Position::new(7, 10),
        EntityKind::Terminal {
            store: Store::new(300_000).with(ResourceType::Energy, 5000),
        },
    );
    world.spawn(
        Position::new(7, 13),
        EntityKind::Storage {
            store: Store::new(1_000_000).with(ResourceType::Energy, 20_000),
        },
    );
    world.spawn(
        Position::new(30, 8),
        EntityKind::Source {
            energy: 3000,
            capacity: 3000,
        },
    );
    world.spawn(
        Position::new(40, 40),
        EntityKind::Source {
            energy: 3000,
            capacity: 3000,
        },
    );
    world.spawn(
        Position::new(31, 9),
        EntityKind::Container {
            store: Store::new(2000).with(ResourceType::Energy, 800),
        },
    );
    for x in 14..30 {
        let hits = if x % 4 == 0 { 500 } else { 4200 };
        world.spawn(
            Position::new(x, 20),
            EntityKind::Road {
                hits,
                hits_max: 5000,
            },
        );
    }

    let mut agents = AgentRegistry::new();
    let upgrader = [BodyPart::Work, BodyPart::Work, BodyPart::Carry, BodyPart::Move];
    for pos in [Position::new(20, 12), Position::new(24, 30)] {
        let id = agents.next_id();
        agents.add(Agent::new(id, Role::Upgrader, pos).with_body(&upgrader).with_carry_capacity(50));
    }
    let id = agents.next_id();
    agents.add(
        Agent::new(id, Role::Worker, Position::new(15, 21))
            .with_body(&[BodyPart::Work, BodyPart::Carry, BodyPart::Move])
            .with_carry_capacity(50)
            .with_energy(50),
    );
    let id = agents.next_id();
    agents.add(
        Agent::new(id, Role::Transporter, Position::new(8, 14))
            .with_body(&[BodyPart::Carry, BodyPart::Carry, BodyPart::Move])
            .with_carry_capacity(100),
    );
    // Waits next to the boosting lab with a full load, so it never leaves to recharge
    let booster = agents.next_id();
    agents.add(
        Agent::new(booster, Role::Upgrader, Position::new(8, 10))
            .with_body(&upgrader)
            .with_carry_capacity(50)
            .with_energy(50),
    );

    Demo {
        world,
        agents,
        terminal,
        booster: Some(booster),
    }
}

/// Carry out every assigned task in one step
fn execute_tasks(world: &mut SimWorld, agents: &mut AgentRegistry) {
    let ids: Vec<_> = agents.iter().filter(|a| a.task.is_some()).map(|a| a.id).collect();
    for id in ids {
        let Some(agent) = agents.get_mut(id) else {
            continue;
        };
        let Some(task) = agent.task.take() else {
            continue;
        };
        match task.kind {
            TaskKind::Withdraw | TaskKind::Pickup | TaskKind::Harvest => {
                let wanted = agent.free_carry();
                let taken = world.withdraw(task.target, ResourceType::Energy, wanted);
                agent.carry.add(ResourceType::Energy, taken);
                agent.pos = task.target_pos;
            }
            TaskKind::Repair => {
                let energy = agent.carry.remove(ResourceType::Energy, agent.carry.get(ResourceType::Energy));
                if let Some(EntityKind::Road { hits, hits_max }) =
                    world.get_mut(task.target).map(|e| &mut e.kind)
                {
                    *hits = (*hits + energy * REPAIR_POWER).min(*hits_max);
                }
            }
        }
        // Upgraders spend what they carry right away
        if agent.role == Role::Upgrader {
            agent.carry.remove(ResourceType::Energy, agent.carry.get(ResourceType::Energy));
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("colony_core=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::new(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let mut memory = match &args.memory {
        Some(path) => MemoryStore::load(path)?,
        None => MemoryStore::new(),
    };

    let mut demo = build_world();
    let planner = StockTargetPlanner::new(vec![
        (ResourceType::UtriumHydride, 600),
        (ResourceType::Hydroxide, 300),
    ]);
    let mut colony = Colony::new(
        COLONY,
        vec![RoomCoord::new(0, 0)],
        Position::new(8, 12),
        config,
        Box::new(planner),
    );
    let mut network = RequestLog::new().with_assets(ResourceType::LemergiumHydride, 10_000);
    let mut stats = Stats::new();

    tracing::info!("Running {} for {} ticks", COLONY, args.ticks);
    let mut reactions = 0u32;
    let mut stalls = 0u32;
    for _ in 0..args.ticks {
        let events = colony.run_tick(
            &mut memory,
            &mut demo.world,
            &mut demo.agents,
            &mut network,
            &mut stats,
        );
        for event in &events {
            match event {
                ColonyEvent::ReactionRun { .. } => reactions += 1,
                ColonyEvent::Stalled { .. } => stalls += 1,
                _ => {}
            }
            tracing::trace!("{:?}", event);
        }

        if let Some(booster) = demo.booster.take() {
            let boosting_lab = colony.pipeline().layout().boosting_labs.first().copied();
            if let Some(lab) = boosting_lab {
                colony.request_boost(
                    &mut memory,
                    lab,
                    ResourceType::LemergiumHydride,
                    booster,
                    &demo.agents,
                    &network,
                );
            } else {
                demo.booster = Some(booster);
            }
        }

        demo.world.instant_haul(colony.requests(), demo.terminal);
        for request in network.drain() {
            demo.world.deposit(request.receiver, request.resource, request.amount);
        }
        execute_tasks(&mut demo.world, &mut demo.agents);
        demo.world.advance();
        for expired in demo.agents.advance() {
            tracing::debug!("{} expired", expired);
        }
    }

    let chamber = &memory.colony(COLONY)?.evolution_chamber;
    println!("\n=== {} after {} ticks ===", COLONY, demo.world.time());
    println!("Pipeline status: {:?}", chamber.status());
    println!("Reactions run: {}, stalls: {}", reactions, stalls);
    for (resource, amount) in &chamber.stats.total_production {
        println!("  produced {:>6} {}", amount, resource);
    }
    println!("Lab usage (rolling): {:.3}", chamber.stats.avg_usage);
    for agent in demo.agents.iter() {
        let boosted = agent.body.iter().filter(|slot| slot.boost.is_some()).count();
        println!(
            "  {} {:?} at {} carrying {} energy, {} boosted parts",
            agent.id,
            agent.role,
            agent.pos,
            agent.carry.get(ResourceType::Energy),
            boosted
        );
    }
    println!("{} stats recorded", stats.len());

    if let Some(path) = &args.memory {
        memory.save(path)?;
        tracing::info!("Memory saved to {}", path.display());
    }
    Ok(())
}
