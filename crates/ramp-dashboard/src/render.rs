//! Terminal dashboard, alert panel, and countdown line.

use std::io::Write;
use std::time::Duration;

use chrono::Local;
use colored::Colorize;

use ramp_state::{AlertContext, Observer, RampDirection, ScalingConfig, Snapshot};

const RULE_WIDTH: usize = 90;
const GLOBAL_BAR_WIDTH: usize = 50;
const INSTANCE_BAR_WIDTH: usize = 20;

/// Console [`Observer`]: repaints the dashboard every tick, renders the
/// saturation alert panel once, and drives the pause countdown line.
pub struct ConsoleDashboard {
    config: ScalingConfig,
}

impl ConsoleDashboard {
    pub fn new(config: ScalingConfig) -> Self {
        Self { config }
    }

    /// Startup banner: configuration and scenario summary, printed once
    /// before the first tick.
    pub fn banner(&self) {
        let c = &self.config;
        println!("{}", "═".repeat(RULE_WIDTH).bright_blue().bold());
        println!(
            "{}",
            "      AUTOSCALER SIMULATION".bright_cyan().bold()
        );
        println!("{}\n", "═".repeat(RULE_WIDTH).bright_blue().bold());

        println!("{}", "Configuration:".bold());
        println!("   app:    {} ({})", c.app_name, c.image);
        println!(
            "   fleet:  {} users/replica | {}..={} replicas | {} users max capacity",
            c.per_replica_capacity,
            c.min_replicas,
            c.max_replicas,
            c.max_servable_capacity()
        );
        println!("\n{}", "Scenario:".bold());
        println!(
            "   {} ramp 0 → {} users (+{}/tick)",
            "1.".green(),
            c.demand_ceiling,
            c.demand_increment
        );
        println!(
            "   {} alert at {} users ({}s pause)",
            "2.".red(),
            c.demand_ceiling,
            c.alert_pause.as_secs()
        );
        println!(
            "   {} ramp {} → {} users, then drain and exit",
            "3.".yellow(),
            c.demand_ceiling,
            c.demand_floor
        );
        println!();
    }

    fn render_dashboard(&self, snapshot: &Snapshot) {
        let c = &self.config;
        let current = snapshot.instances.len() as u32;
        let capacity = current * c.per_replica_capacity;

        // Repaint from the top-left each tick.
        print!("\x1b[2J\x1b[H");
        println!("{}", "═".repeat(RULE_WIDTH).bright_blue().bold());
        println!(
            "{}",
            format!(
                "      AUTOSCALER — {}",
                Local::now().format("%H:%M:%S")
            )
            .bright_cyan()
            .bold()
        );
        println!("{}\n", "═".repeat(RULE_WIDTH).bright_blue().bold());

        // Trend.
        let trend = match snapshot.direction {
            RampDirection::Increasing => "INCREASING".green().bold(),
            RampDirection::Decreasing => "DECREASING".yellow().bold(),
        };
        let objective = match snapshot.direction {
            RampDirection::Increasing => {
                format!("{} users, then descent", c.demand_ceiling)
            }
            RampDirection::Decreasing => {
                format!("{} users, then stop", c.demand_floor)
            }
        };
        println!("{}", "SIMULATION".bold());
        println!("   trend:     {trend} (±{} users/tick)", c.demand_increment);
        println!("   objective: {objective}\n");

        // Demand vs fleet capacity.
        let overflow = if snapshot.demand > capacity {
            "⚠ EXCEEDED".red().bold()
        } else {
            "✓".green().bold()
        };
        println!("{}", "USERS".bold());
        println!(
            "   current:   {} users",
            snapshot.demand.to_string().magenta().bold()
        );
        println!(
            "   capacity:  {} users {overflow}",
            capacity.to_string().bold()
        );

        let pct = percent(snapshot.demand, c.demand_ceiling);
        println!("\n   overall progress:");
        println!(
            "   {} {:.0}% ({}/{})",
            load_bar(pct, GLOBAL_BAR_WIDTH),
            pct,
            snapshot.demand,
            c.demand_ceiling
        );

        // Fleet.
        println!("\n{}", "REPLICAS".bold());
        println!(
            "   actual: {} | desired: {} | bounds: {}..={}",
            current.to_string().green().bold(),
            snapshot.desired.to_string().yellow().bold(),
            c.min_replicas,
            c.max_replicas
        );

        if snapshot.instances.is_empty() {
            println!("\n   {}", "no running instances".yellow());
        } else {
            println!();
            for (index, instance) in snapshot.instances.iter().enumerate() {
                // Each replica serves one contiguous demand band.
                let band_start = index as u32 * c.per_replica_capacity;
                let band_load = snapshot
                    .demand
                    .saturating_sub(band_start)
                    .min(c.per_replica_capacity);
                let band_pct = percent(band_load, c.per_replica_capacity);

                let port = instance
                    .port
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "n/a".to_string());
                println!(
                    "   {} {}",
                    format!("replica {}", index + 1).bold(),
                    format!("(port {port})").cyan()
                );
                println!(
                    "   {} {:.0}% ({}/{} users)",
                    load_bar(band_pct, INSTANCE_BAR_WIDTH),
                    band_pct,
                    band_load,
                    c.per_replica_capacity
                );
                println!("   {}\n", instance.name.cyan());
            }
        }

        // Host resources.
        let cpu_used = current as f64 * c.container_cpu;
        let ram_used = current as f64 * c.container_memory_gb;
        let cpu_pct = 100.0 * cpu_used / c.server_total_cpu;
        let ram_pct = 100.0 * ram_used / c.server_total_ram_gb;
        println!("{}", "HOST RESOURCES".bold());
        println!(
            "   cpu:  {cpu_used:.1}/{:.0} cores ({cpu_pct:.1}%) {}",
            c.server_total_cpu,
            "█".repeat((cpu_pct / 5.0) as usize)
        );
        println!(
            "   ram:  {ram_used:.1}/{:.0} GB ({ram_pct:.1}%) {}",
            c.server_total_ram_gb,
            "█".repeat((ram_pct / 5.0) as usize)
        );

        // Next cycle.
        println!();
        if current < snapshot.desired {
            println!(
                "{}",
                format!("next cycle: scale up to {} replica(s)", snapshot.desired).yellow()
            );
        } else if current > snapshot.desired {
            println!(
                "{}",
                format!("next cycle: scale down to {} replica(s)", snapshot.desired).yellow()
            );
        } else {
            println!("{}", "scaling at target".green());
        }

        println!("\n{}", "═".repeat(RULE_WIDTH).bright_blue().bold());
        println!("{}\n", "press Ctrl+C to stop".cyan());
    }

    fn render_alert(&self, ctx: &AlertContext) {
        print!("\x1b[2J\x1b[H");
        println!("{}", "═".repeat(RULE_WIDTH).red().bold());
        println!(
            "{}",
            "   ⚠ SATURATION ALERT — HOST CAPACITY REACHED, HORIZONTAL SCALING REQUIRED"
                .red()
                .bold()
        );
        println!("{}\n", "═".repeat(RULE_WIDTH).red().bold());

        println!("{}", "Situation:".yellow().bold());
        println!(
            "   • current demand:    {} users",
            ctx.demand.to_string().red().bold()
        );
        println!(
            "   • host capacity:     {} users ({} replicas max)",
            ctx.max_capacity.to_string().bold(),
            ctx.replica_ceiling
        );
        println!(
            "   • replica ceiling:   {}/{} — no headroom left",
            ctx.replica_ceiling.to_string().bold(),
            ctx.replica_ceiling
        );

        println!("\n{}", "Recommendation:".cyan().bold());
        println!(
            "   • hosts needed:      {}",
            ctx.servers_needed.to_string().red().bold()
        );
        println!(
            "   • excess demand:     {} users",
            ctx.excess_demand.to_string().red().bold()
        );
        println!(
            "   • add {} host(s) behind a load balancer, or raise the replica",
            ctx.servers_needed.saturating_sub(1).max(1)
        );
        println!("     ceiling after scaling the host vertically\n");

        println!("{}", "═".repeat(RULE_WIDTH).red().bold());
        println!(
            "{}\n",
            format!(
                "ramp pauses for {}s, then resumes in decreasing mode",
                self.config.alert_pause.as_secs()
            )
            .cyan()
        );
    }
}

impl Observer for ConsoleDashboard {
    fn on_tick(&self, snapshot: &Snapshot) {
        self.render_dashboard(snapshot);
    }

    fn on_alert(&self, ctx: &AlertContext) {
        self.render_alert(ctx);
    }

    fn on_countdown(&self, remaining: Duration) {
        let secs = remaining.as_secs();
        let total = self.config.alert_pause.as_secs().max(1);
        let elapsed = total.saturating_sub(secs);
        print!(
            "\r{} {}",
            format!("resuming in {secs:>2}s").cyan(),
            "█".repeat((elapsed / 2) as usize).yellow()
        );
        let _ = std::io::stdout().flush();
    }

    fn on_terminated(&self, snapshot: &Snapshot) {
        self.render_dashboard(snapshot);
        println!(
            "{}",
            format!(
                "simulation finished at the demand floor ({} users); draining",
                snapshot.demand
            )
            .green()
            .bold()
        );
    }
}

/// Percentage clamped to 0..=100.
fn percent(value: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (100.0 * value as f64 / total as f64).min(100.0)
}

/// Filled/empty bar colored by load: green, then yellow past 70%, red
/// past 90%.
fn load_bar(pct: f64, width: usize) -> String {
    let filled = ((pct / 100.0) * width as f64).floor() as usize;
    let filled = filled.min(width);
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(width - filled));
    if pct > 90.0 {
        bar.red().to_string()
    } else if pct > 70.0 {
        bar.yellow().to_string()
    } else {
        bar.green().to_string()
    }
}
