use super::theme;
use super::{TileSplitter, WorkflowStatus};
use crate::processing::{MAX_GRID, MIN_GRID};
use crate::utils::file_size::format_size;
use eframe::egui::{self, Align, Align2, Color32, FontId, RichText};

const CONTENT_WIDTH: f32 = 450.0;
const TILE_GAP: f32 = 8.0;

/// Clicks collected while drawing, applied once the frame is laid out.
#[derive(Default)]
struct Actions {
    pick_image: bool,
    process: bool,
    clear: bool,
    save_archive: bool,
    save_tile: Option<String>,
    reveal: bool,
}

impl TileSplitter {
    pub fn render(&mut self, ctx: &egui::Context) {
        let mut actions = Actions::default();

        egui::CentralPanel::default().show(ctx, |ui| {
            let footer_height = 48.0;
            let content_height = ui.available_height() - footer_height;

            egui::ScrollArea::vertical()
                .max_height(content_height)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.add_space(20.0);
                    self.render_header(ui);
                    ui.add_space(15.0);

                    ui.vertical_centered(|ui| {
                        ui.set_max_width(CONTENT_WIDTH);
                        self.render_drop_zone(ctx, ui, &mut actions);
                        ui.add_space(20.0);
                        self.render_options(ui);
                        ui.add_space(25.0);
                        self.render_process_button(ui, &mut actions);
                    });

                    ui.add_space(25.0);
                    self.render_results(ctx, ui, &mut actions);
                    ui.add_space(20.0);
                });

            ui.with_layout(egui::Layout::bottom_up(Align::Center), |ui| {
                ui.add_space(10.0);
                self.render_footer(ui, &mut actions);
            });
        });

        self.apply(actions);
    }

    fn apply(&mut self, actions: Actions) {
        if actions.pick_image {
            self.pick_image();
        }
        if actions.process {
            self.start_processing();
        }
        if actions.clear {
            self.reset();
        }
        if actions.save_archive {
            self.save_archive();
        }
        if let Some(name) = actions.save_tile {
            self.save_tile(&name);
        }
        if actions.reveal {
            self.reveal_last_saved();
        }
    }

    fn render_header(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.heading("Insta-friendly image splitter");
            ui.add_space(8.0);
            let muted = ui.visuals().text_color().gamma_multiply(0.7);
            ui.label(
                RichText::new("Upload a picture and choose how to process the image.").color(muted),
            );
            ui.label(
                RichText::new(
                    "You can split the image into a grid of squares. Optionally, you can add \
                     white stripes to the top and bottom of the processed image(s).",
                )
                .color(muted),
            );
        });
    }

    fn render_drop_zone(&mut self, ctx: &egui::Context, ui: &mut egui::Ui, actions: &mut Actions) {
        let has_image = self.state.image.is_some();
        let size = egui::vec2(ui.available_width(), 150.0);
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 5.0, theme::drop_zone_fill(has_image, self.state.dragging));

        let mut text_rect = rect;
        if let Some(image) = &self.state.image {
            if let Some(texture) = self.previews.source_texture(ctx, image) {
                let max = egui::vec2(rect.height() - 20.0, rect.height() - 20.0);
                let thumb = fit_within(texture.size_vec2(), max);
                let thumb_rect = egui::Rect::from_min_size(
                    rect.left_top() + egui::vec2(10.0, (rect.height() - thumb.y) / 2.0),
                    thumb,
                );
                painter.image(
                    texture.id(),
                    thumb_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    Color32::WHITE,
                );
                text_rect.min.x = thumb_rect.max.x;
            }
        }

        let text = if self.state.image_receiver.is_some() {
            "Reading image...".to_string()
        } else if has_image {
            "Image uploaded!".to_string()
        } else {
            "Click to upload image\nor drag and drop the file".to_string()
        };
        painter.text(
            text_rect.center(),
            Align2::CENTER_CENTER,
            text,
            FontId::proportional(16.0),
            Color32::from_gray(40),
        );

        let response = response.on_hover_cursor(egui::CursorIcon::PointingHand);
        if response.clicked() {
            actions.pick_image = true;
        }
    }

    fn render_options(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.set_width(ui.available_width());
            ui.add_space(10.0);

            ui.horizontal(|ui| {
                ui.label("Rows:");
                let mut rows = self.state.params.rows();
                if ui
                    .add(egui::DragValue::new(&mut rows).clamp_range(MIN_GRID..=MAX_GRID))
                    .changed()
                {
                    self.state.params.set_rows(rows);
                }

                ui.add_space(10.0);
                ui.label("Cols:");
                let mut columns = self.state.params.columns();
                if ui
                    .add(egui::DragValue::new(&mut columns).clamp_range(MIN_GRID..=MAX_GRID))
                    .changed()
                {
                    self.state.params.set_columns(columns);
                }
            });

            ui.add_space(10.0);
            let mut stripes = self.state.params.stripes();
            if ui.checkbox(&mut stripes, "White stripes").changed() {
                self.state.params.set_stripes(stripes);
            }

            ui.add_space(10.0);
            ui.horizontal(|ui| {
                ui.label("Stripe height (%):");
                let mut percent = self.state.params.stripe_height_percent();
                ui.add_enabled_ui(stripes, |ui| {
                    let field = egui::DragValue::new(&mut percent)
                        .clamp_range(0.0..=100.0)
                        .speed(0.5)
                        .max_decimals(2);
                    if ui.add(field).changed() {
                        self.state.params.set_stripe_height_percent(percent);
                    }
                });
            });
            ui.add_space(10.0);
        });
    }

    fn render_process_button(&self, ui: &mut egui::Ui, actions: &mut Actions) {
        if self.state.is_submitting() {
            ui.add(egui::Spinner::new().size(24.0));
            ui.label(self.state.get_status_text());
            return;
        }

        ui.add_enabled_ui(self.state.can_submit(), |ui| {
            let button = egui::Button::new("Process image").min_size(egui::vec2(150.0, 36.0));
            if ui.add(button).clicked() {
                actions.process = true;
            }
        });

        if self.state.status != WorkflowStatus::Idle {
            ui.add_space(5.0);
            if ui.small_button("Clear").clicked() {
                actions.clear = true;
            }
        }
    }

    fn render_results(&mut self, ctx: &egui::Context, ui: &mut egui::Ui, actions: &mut Actions) {
        let Some(result) = self.state.result.as_ref().filter(|r| !r.is_empty()) else {
            return;
        };
        let previews = &mut self.previews;

        ui.vertical_centered(|ui| {
            ui.label(
                "Tap an image to save it in full resolution, scroll down to find the full \
                 resolution images or download a zip with all the images.",
            );
            let label = format!("Download all (.zip, {})", format_size(result.archive.len()));
            if ui.link(label).clicked() {
                actions.save_archive = true;
            }
        });
        ui.add_space(15.0);

        let columns = result.columns.max(1) as usize;
        egui::Frame::none()
            .fill(theme::gallery_fill())
            .inner_margin(egui::Margin::same(TILE_GAP))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                let tile_width = ((ui.available_width() - TILE_GAP * (columns as f32 - 1.0))
                    / columns as f32)
                    .max(16.0);

                for row in result.tiles.chunks(columns) {
                    ui.horizontal(|ui| {
                        ui.spacing_mut().item_spacing.x = TILE_GAP;
                        for tile in row {
                            let hover = format!("{} ({})", tile.name, format_size(tile.bytes.len()));
                            let response = match previews.tile_texture(ctx, result, tile) {
                                Some(texture) => {
                                    let size = fit_within(
                                        texture.size_vec2(),
                                        egui::vec2(tile_width, f32::INFINITY),
                                    );
                                    ui.add(
                                        egui::Image::new(&texture)
                                            .fit_to_exact_size(size)
                                            .sense(egui::Sense::click()),
                                    )
                                }
                                None => ui.add_sized(
                                    [tile_width, tile_width / 2.0],
                                    egui::Button::new(&tile.name),
                                ),
                            };
                            if response
                                .on_hover_cursor(egui::CursorIcon::PointingHand)
                                .on_hover_text(hover)
                                .clicked()
                            {
                                actions.save_tile = Some(tile.name.clone());
                            }
                        }
                    });
                    ui.add_space(TILE_GAP);
                }
            });

        ui.add_space(15.0);
        let full_width = ui.available_width();
        for tile in &result.tiles {
            if let Some(texture) = previews.tile_texture(ctx, result, tile) {
                let size = fit_within(texture.size_vec2(), egui::vec2(full_width, f32::INFINITY));
                ui.add(egui::Image::new(&texture).fit_to_exact_size(size));
                ui.add_space(8.0);
            }
        }
    }

    fn render_footer(&self, ui: &mut egui::Ui, actions: &mut Actions) {
        ui.horizontal(|ui| {
            ui.label("Made with");
            ui.colored_label(theme::accent(), "♥");
        });

        if let Some(error) = &self.state.error_message {
            ui.add_space(5.0);
            ui.colored_label(theme::error(), error);
        }

        if let Some(notice) = &self.state.notice {
            ui.add_space(5.0);
            ui.horizontal(|ui| {
                ui.label(notice);
                if self.last_saved.is_some() && ui.small_button("Show in folder").clicked() {
                    actions.reveal = true;
                }
            });
        }
    }
}

/// Scales `size` down (never up) so it fits inside `max`, keeping the aspect
/// ratio.
fn fit_within(size: egui::Vec2, max: egui::Vec2) -> egui::Vec2 {
    if size.x <= 0.0 || size.y <= 0.0 {
        return egui::Vec2::ZERO;
    }
    let scale = (max.x / size.x).min(max.y / size.y).min(1.0);
    size * scale
}
