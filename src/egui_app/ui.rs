//! egui renderer for the drawing pad.

use eframe::egui::{
    self, Align, Color32, Event, Frame, Id, Layout, Margin, Modal, PointerButton, Rect, RichText,
    Sense, TextureHandle, TextureOptions, Ui, Vec2, pos2, vec2,
};

use crate::egui_app::controller::DigitPadController;
use crate::egui_app::view_model;
use crate::feedback::Feedback;

const LABEL_SIZE: f32 = 20.0;
const BUTTON_HEIGHT: f32 = 32.0;
const PANEL_PADDING: i8 = 12;

/// Smallest window that still fits the canvas, buttons and labels.
pub fn min_viewport_size(canvas_size: u32) -> Vec2 {
    let side = canvas_size as f32 + 2.0 * PANEL_PADDING as f32;
    vec2(side, side + 2.0 * BUTTON_HEIGHT + 5.0 * (LABEL_SIZE + 10.0) + 24.0)
}

/// Renders the egui UI from the controller state.
pub struct EguiApp {
    controller: DigitPadController,
    visuals_set: bool,
    canvas_tex: Option<TextureHandle>,
}

impl EguiApp {
    pub fn new(controller: DigitPadController) -> Self {
        Self {
            controller,
            visuals_set: false,
            canvas_tex: None,
        }
    }

    fn apply_visuals(&mut self, ctx: &egui::Context) {
        if self.visuals_set {
            return;
        }
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = Color32::from_rgb(12, 12, 12);
        visuals.panel_fill = Color32::from_rgb(16, 16, 16);
        ctx.set_visuals(visuals);
        self.visuals_set = true;
    }

    /// Upload the bitmap when it changed since the last frame.
    fn sync_canvas_texture(&mut self, ctx: &egui::Context) -> TextureHandle {
        let dirty = self.controller.take_canvas_redraw();
        match &mut self.canvas_tex {
            Some(tex) => {
                if dirty {
                    tex.set(self.controller.canvas().to_color_image(), TextureOptions::NEAREST);
                }
                tex.clone()
            }
            None => {
                let tex = ctx.load_texture(
                    "digitpad_canvas",
                    self.controller.canvas().to_color_image(),
                    TextureOptions::NEAREST,
                );
                self.canvas_tex = Some(tex.clone());
                tex
            }
        }
    }

    fn render_canvas(&mut self, ui: &mut Ui) {
        let tex = self.sync_canvas_texture(ui.ctx());
        let side = self.controller.canvas().size() as f32;
        let (rect, _response) = ui.allocate_exact_size(vec2(side, side), Sense::click_and_drag());
        ui.painter().image(
            tex.id(),
            rect,
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            Color32::WHITE,
        );
        if !self.controller.is_modal() {
            self.forward_pointer_events(ui, rect);
        }
    }

    /// Feed raw pointer events to the canvas in bitmap coordinates.
    ///
    /// Presses only start strokes inside the canvas; moves and releases are
    /// forwarded wherever they happen so a stroke can leave the canvas edge.
    /// The held state is replayed in event order, so a move that precedes a
    /// release in the same frame still extends the stroke.
    fn forward_pointer_events(&mut self, ui: &Ui, rect: Rect) {
        let events = ui.input(|input| input.events.clone());
        let origin = rect.min.to_vec2();
        let mut primary_held = self.controller.canvas().is_drawing();
        for event in events {
            match event {
                Event::PointerButton {
                    pos,
                    button,
                    pressed: true,
                    ..
                } if rect.contains(pos) => {
                    self.controller.pointer_down(pos - origin, button);
                    primary_held |= button == PointerButton::Primary;
                }
                Event::PointerButton {
                    button,
                    pressed: false,
                    ..
                } => {
                    self.controller.pointer_up(button);
                    if button == PointerButton::Primary {
                        primary_held = false;
                    }
                }
                Event::PointerMoved(pos) => {
                    self.controller.pointer_move(pos - origin, primary_held);
                }
                Event::PointerGone => {
                    self.controller.pointer_up(PointerButton::Primary);
                    primary_held = false;
                }
                _ => {}
            }
        }
    }

    fn render_buttons(&mut self, ui: &mut Ui) {
        let enabled = !self.controller.is_modal();
        let width = ui.available_width();
        let predict = ui.add_enabled(
            enabled,
            egui::Button::new("Predict").min_size(vec2(width, BUTTON_HEIGHT)),
        );
        if predict.clicked() {
            self.controller.predict();
        }
        let clear = ui.add_enabled(
            enabled,
            egui::Button::new("Clear").min_size(vec2(width, BUTTON_HEIGHT)),
        );
        if clear.clicked() {
            self.controller.clear();
        }
    }

    fn render_labels(&self, ui: &mut Ui) {
        let state = &self.controller.ui;
        for text in [
            &state.device,
            &state.prediction,
            &state.inference_time,
            &state.accuracy,
        ] {
            ui.label(RichText::new(text).size(LABEL_SIZE).color(Color32::WHITE));
        }
        ui.add_space(4.0);
        ui.label(RichText::new(&state.status.text).color(state.status.tone.color()));
    }

    fn render_confirmation(&mut self, ctx: &egui::Context) {
        let Some(pending) = self.controller.pending_confirmation() else {
            return;
        };
        let mut choice = None;
        let modal = Modal::new(Id::new("confirm_prediction")).show(ctx, |ui| {
            ui.set_width(260.0);
            ui.heading("Confirm prediction");
            ui.add_space(8.0);
            ui.label(view_model::confirmation_text(pending.label));
            ui.add_space(12.0);
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                // Right-to-left: "No" sits rightmost and takes focus as the default.
                let no = ui.button("No");
                if ui.memory(|mem| mem.focused().is_none()) {
                    no.request_focus();
                }
                if no.clicked() {
                    choice = Some(Feedback::Incorrect);
                }
                if ui.button("Yes").clicked() {
                    choice = Some(Feedback::Correct);
                }
            });
        });
        match choice {
            Some(feedback) => self.controller.answer(feedback),
            None if modal.should_close() => self.controller.dismiss_confirmation(),
            None => {}
        }
    }
}

impl EguiApp {
    /// Lay out one frame.
    pub fn show(&mut self, ctx: &egui::Context) {
        self.apply_visuals(ctx);
        egui::CentralPanel::default()
            .frame(Frame::new().inner_margin(Margin::same(PANEL_PADDING)))
            .show(ctx, |ui| {
                ui.vertical(|ui| {
                    self.render_canvas(ui);
                    ui.add_space(8.0);
                    self.render_buttons(ui);
                    ui.add_space(8.0);
                    self.render_labels(ui);
                });
            });
        self.render_confirmation(ctx);
    }
}

impl eframe::App for EguiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
    }
}
