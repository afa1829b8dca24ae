use eframe::egui;
use egui_plot::{Line, Plot, Points};

use parafoil_sim::dynamics::state::{OMEGA, X, Y};
use parafoil_sim::sim::{Parafoil, Sample, Trajectory};
use parafoil_sim::vehicle::presets;
use parafoil_sim::ControlStrategy;

fn main() -> eframe::Result {
    env_logger::init();

    let params = presets::demo_drop();
    let trajectory = ControlStrategy::homing(10.0_f64.to_radians())
        .and_then(|s| Ok(Parafoil::new(params)?.with_strategy(s)))
        .and_then(|mut p| p.simulate(2000));
    let trajectory = match trajectory {
        Ok(t) => t,
        Err(e) => {
            eprintln!("simulation failed: {e}");
            std::process::exit(1);
        }
    };

    let app = DescentViz { trajectory, name: "Homing".into() };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("Parafoil Descent", options, Box::new(|_| Ok(Box::new(app))))
}

struct DescentViz {
    trajectory: Trajectory,
    name: String,
}

impl DescentViz {
    fn series(&self, f: impl Fn(f64, &Sample) -> [f64; 2]) -> Vec<[f64; 2]> {
        self.trajectory.iter().map(|(t, s)| f(t, s)).collect()
    }
}

impl eframe::App for DescentViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading(format!("Guidance: {}", self.name));
            if let Some((t, last)) = self.trajectory.last() {
                ui.label(format!(
                    "Flight: {:.1} s  |  Landing: ({:.1}, {:.1}) m  |  Miss: {:.1} m",
                    t,
                    last.state[X],
                    last.state[Y],
                    last.state[X].hypot(last.state[Y]),
                ));
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let half_w = available.x / 2.0 - 8.0;
            let half_h = available.y / 2.0 - 8.0;

            ui.horizontal(|ui| {
                // Ground track
                ui.vertical(|ui| {
                    ui.label("Ground track (m)");
                    let track = self.series(|_, s| [s.state[X], s.state[Y]]);
                    Plot::new("track")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("x (m)")
                        .data_aspect(1.0)
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Track", track));
                            plot_ui.points(Points::new("Target", vec![[0.0, 0.0]]).radius(4.0));
                        });
                });

                // Heading vs Time
                ui.vertical(|ui| {
                    ui.label("Heading (deg)");
                    let points = self.series(|t, s| [t, s.state[OMEGA].to_degrees()]);
                    Plot::new("heading")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Heading", points));
                        });
                });
            });

            ui.horizontal(|ui| {
                // Control vs Time
                ui.vertical(|ui| {
                    ui.label("Turn rate command (deg/s)");
                    let points = self.series(|t, s| [t, s.control.to_degrees()]);
                    Plot::new("control")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("u", points));
                        });
                });

                // Height vs Time
                ui.vertical(|ui| {
                    ui.label("Height (m)");
                    let points = self.series(|t, s| [t, s.altitude]);
                    Plot::new("height")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Height", points));
                        });
                });
            });
        });
    }
}
