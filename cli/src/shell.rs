//! Line-oriented interactive session over a `Studio`.
//!
//! # Design
//! Each input line is split with shell quoting rules and parsed with clap, so
//! commands get the same argument validation and `help` output as the binary
//! itself. Quote an argument to keep its spaces: `project new "Weekend Golf"`.
//! The shell only translates commands into `Studio` actions and renders the
//! resulting state; all request logic stays in the core. Alerts raised by an
//! action are printed after the command's own output, prefixed with `!`.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use carmod_core::{
    AuthMode, DisplayImage, Point, Studio, TokenStore, Transport, VehicleFilter, WheelFilter,
};
use clap::{Parser, Subcommand};

pub const PROMPT: &str = "carmod> ";

#[derive(Parser, Debug)]
#[command(name = "carmod", no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Create an account and sign in.
    Signup { email: String, password: String },
    /// Sign in with an existing account.
    Login { email: String, password: String },
    /// Sign out and forget the stored token.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// List your projects.
    Projects,
    /// Manage the current project.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Publish the current project and print its link.
    Share {
        /// Issue a link that is not served to anonymous readers.
        #[arg(long)]
        private: bool,
    },
    /// Revoke the current project's public link.
    Unshare,
    /// Open a shared project by its slug. Works without signing in.
    Shared { slug: String },
    /// Inspect or delete a stored image.
    Image {
        #[command(subcommand)]
        action: ImageAction,
    },
    /// List catalog wheels, or only those that fit a vehicle spec.
    Wheels {
        #[arg(long, conflicts_with = "fits")]
        brand: Option<String>,
        #[arg(long, value_name = "VEHICLE_ID")]
        fits: Option<i64>,
    },
    /// Select a wheel for overlay.
    Wheel { id: i64 },
    /// Search vehicle fitment specs.
    Vehicles {
        #[arg(long)]
        make: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Show one vehicle fitment spec.
    Vehicle { id: i64 },
    /// Upload a local photo into the current project.
    Upload { file: PathBuf },
    /// Segment the vehicle body in the uploaded photo.
    Segment,
    /// Set the hue (-90..90), saturation and value (-1..1) deltas.
    Adjust {
        #[arg(allow_negative_numbers = true)]
        dh: i32,
        #[arg(allow_negative_numbers = true)]
        ds: f64,
        #[arg(allow_negative_numbers = true)]
        dv: f64,
    },
    /// Recolor the body with the current adjustment.
    Recolor,
    /// Composite the selected wheel. Optionally give four corners as x y pairs.
    Overlay {
        #[arg(allow_negative_numbers = true, num_args = 0..)]
        coords: Vec<f64>,
    },
    /// Show what the preview pane would display.
    Show,
    /// Check that the backend is reachable.
    Health,
    /// Leave the shell.
    #[command(alias = "exit")]
    Quit,
}

#[derive(Subcommand, Debug)]
enum ProjectAction {
    /// Create a project and make it current.
    New {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Make a loaded project current.
    Select { id: i64 },
    /// Show the current project and its images.
    Show,
    /// Rename the current project.
    Rename {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Delete the current project.
    Delete,
}

#[derive(Subcommand, Debug)]
enum ImageAction {
    /// Show an image's URL, size and project.
    Show { id: i64 },
    /// Delete an image from its project.
    Delete { id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<T, S> {
    studio: Studio<T, S>,
}

impl<T: Transport, S: TokenStore> Shell<T, S> {
    pub fn new(studio: Studio<T, S>) -> Self {
        Self { studio }
    }

    pub fn studio(&self) -> &Studio<T, S> {
        &self.studio
    }

    pub fn into_studio(self) -> Studio<T, S> {
        self.studio
    }

    /// Read commands until end of input or `quit`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        write!(out, "{PROMPT}")?;
        out.flush()?;
        for line in input.lines() {
            let line = line?;
            if self.execute_line(&line, out)? == Flow::Quit {
                break;
            }
            write!(out, "{PROMPT}")?;
            out.flush()?;
        }
        Ok(())
    }

    /// Run one command line and print its output and any alerts.
    pub fn execute_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        let Some(words) = shlex::split(line) else {
            writeln!(out, "unbalanced quotes")?;
            return Ok(Flow::Continue);
        };
        if words.is_empty() {
            return Ok(Flow::Continue);
        }
        let flow = match Line::try_parse_from(words) {
            Ok(parsed) => self.dispatch(parsed.command, out)?,
            Err(e) => {
                write!(out, "{}", e.render())?;
                Flow::Continue
            }
        };
        for alert in self.studio.take_alerts() {
            writeln!(out, "! {alert}")?;
        }
        Ok(flow)
    }

    fn dispatch<W: Write>(&mut self, command: ShellCommand, out: &mut W) -> io::Result<Flow> {
        match command {
            ShellCommand::Signup { email, password } => {
                self.studio.auth_form.mode = AuthMode::Signup;
                self.authenticate(&email, &password, out)?;
            }
            ShellCommand::Login { email, password } => {
                self.studio.auth_form.mode = AuthMode::Login;
                self.authenticate(&email, &password, out)?;
            }
            ShellCommand::Logout => {
                self.studio.logout();
                writeln!(out, "signed out")?;
            }
            ShellCommand::Whoami => match self.studio.user() {
                Some(user) => writeln!(out, "{} (id {})", user.email, user.id)?,
                None => writeln!(out, "not signed in")?,
            },
            ShellCommand::Projects => self.print_projects(out)?,
            ShellCommand::Project { action } => self.project(action, out)?,
            ShellCommand::Share { private } => {
                if self.studio.current_project().is_none() {
                    writeln!(out, "select a project first")?;
                } else if let Some(link) = self.studio.share_current_project(!private) {
                    writeln!(out, "{}", link.public_url)?;
                }
            }
            ShellCommand::Unshare => {
                if self.studio.current_project().is_none() {
                    writeln!(out, "select a project first")?;
                } else if self.studio.unshare_current_project() {
                    writeln!(out, "sharing disabled")?;
                }
            }
            ShellCommand::Shared { slug } => match self.studio.fetch_shared_project(&slug) {
                Some(shared) => {
                    writeln!(out, "{}", shared.title)?;
                    for image in &shared.images {
                        writeln!(
                            out,
                            "  image    {}",
                            self.studio.client().media_url(&image.url)
                        )?;
                    }
                    for variant in &shared.variants {
                        writeln!(
                            out,
                            "  variant  {}{}",
                            self.studio.client().media_url(&variant.url),
                            variant
                                .description
                                .as_deref()
                                .map(|d| format!("  ({d})"))
                                .unwrap_or_default()
                        )?;
                    }
                }
                None => writeln!(out, "no shared project {slug}")?,
            },
            ShellCommand::Image { action } => self.image(action, out)?,
            ShellCommand::Wheels {
                fits: Some(vehicle_id),
                ..
            } => match self.studio.fetch_compatible_wheels(vehicle_id) {
                Some(spec) => {
                    writeln!(
                        out,
                        "fits {} {} {}{}",
                        spec.year,
                        spec.make,
                        spec.model,
                        spec.rim_diameter
                            .map(|d| format!(" ({d}\" rims)"))
                            .unwrap_or_default()
                    )?;
                    self.print_wheels(out)?;
                }
                None => writeln!(out, "unknown vehicle {vehicle_id}")?,
            },
            ShellCommand::Wheels { brand, fits: None } => {
                self.studio.fetch_wheels(&WheelFilter { brand });
                self.print_wheels(out)?;
            }
            ShellCommand::Wheel { id } => {
                if self.studio.load_wheel(id) {
                    if let Some(wheel) = self.studio.selected_wheel() {
                        writeln!(out, "selected {} {}", wheel.brand, wheel.model)?;
                    }
                } else {
                    writeln!(out, "unknown wheel {id}")?;
                }
            }
            ShellCommand::Vehicles { make, model, year } => {
                self.studio
                    .fetch_vehicle_specs(&VehicleFilter { make, model, year });
                if self.studio.vehicle_specs().is_empty() {
                    writeln!(out, "no matching vehicles")?;
                }
                for spec in self.studio.vehicle_specs() {
                    writeln!(
                        out,
                        "{:>4}  {} {} {}{}",
                        spec.id,
                        spec.year,
                        spec.make,
                        spec.model,
                        spec.trim
                            .as_deref()
                            .map(|t| format!(" {t}"))
                            .unwrap_or_default()
                    )?;
                }
            }
            ShellCommand::Vehicle { id } => match self.studio.fetch_vehicle_spec(id) {
                Some(spec) => {
                    writeln!(out, "{} {} {}", spec.year, spec.make, spec.model)?;
                    let fields = [
                        ("trim", spec.trim.clone()),
                        ("bolt pattern", spec.bolt_pattern.clone()),
                        ("rim diameter", spec.rim_diameter.map(|v| v.to_string())),
                        ("rim width", spec.rim_width.map(|v| v.to_string())),
                        ("offset", spec.offset.map(|v| v.to_string())),
                        ("center bore", spec.center_bore.map(|v| v.to_string())),
                    ];
                    for (label, value) in fields {
                        if let Some(value) = value {
                            writeln!(out, "  {label}: {value}")?;
                        }
                    }
                }
                None => writeln!(out, "unknown vehicle {id}")?,
            },
            ShellCommand::Upload { file } => {
                self.studio.upload_image(&file);
                if let Some(path) = &self.studio.pipeline().image_path {
                    writeln!(out, "uploaded {}", self.studio.client().media_url(path))?;
                }
            }
            ShellCommand::Segment => {
                if self.studio.pipeline().image_path.is_none() {
                    writeln!(out, "upload an image first")?;
                } else {
                    self.studio.segment();
                    if let Some(url) = self.studio.mask_url() {
                        writeln!(out, "mask {url}")?;
                    }
                }
            }
            ShellCommand::Adjust { dh, ds, dv } => {
                self.studio.set_adjustment(dh, ds, dv);
                let adjust = self.studio.pipeline().adjust;
                writeln!(out, "dh={} ds={} dv={}", adjust.dh, adjust.ds, adjust.dv)?;
            }
            ShellCommand::Recolor => {
                if self.studio.pipeline().mask_path.is_none() {
                    writeln!(out, "segment the image first")?;
                } else {
                    let before = self.studio.pipeline().variant_path.clone();
                    self.studio.recolor();
                    self.print_new_variant(before, out)?;
                }
            }
            ShellCommand::Overlay { coords } => self.overlay(&coords, out)?,
            ShellCommand::Show => self.print_display(out)?,
            ShellCommand::Health => match self.studio.check_health() {
                Ok(()) => writeln!(out, "backend is healthy")?,
                Err(e) => writeln!(out, "backend unavailable: {e}")?,
            },
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn authenticate<W: Write>(
        &mut self,
        email: &str,
        password: &str,
        out: &mut W,
    ) -> io::Result<()> {
        self.studio.set_credentials(email, password);
        self.studio.submit_auth();
        if let Some(user) = self.studio.user() {
            writeln!(out, "signed in as {}", user.email)?;
        }
        Ok(())
    }

    fn project<W: Write>(&mut self, action: ProjectAction, out: &mut W) -> io::Result<()> {
        if !self.studio.is_signed_in() {
            return writeln!(out, "log in first");
        }
        match action {
            ProjectAction::New { title } => {
                let title = title.join(" ");
                if title.trim().is_empty() {
                    return writeln!(out, "title cannot be blank");
                }
                self.studio.project_title = title;
                let before = self.studio.projects().len();
                self.studio.create_project();
                if self.studio.projects().len() > before {
                    if let Some(project) = self.studio.current_project() {
                        writeln!(out, "created project {}: {}", project.id, project.title)?;
                    }
                }
            }
            ProjectAction::Select { id } => {
                if self.studio.select_project(id) {
                    writeln!(out, "selected project {id}")?;
                } else {
                    writeln!(out, "unknown project {id}")?;
                }
            }
            ProjectAction::Show => match self.studio.current_project_detail() {
                Some(detail) => {
                    writeln!(
                        out,
                        "{} (id {}, created {})",
                        detail.title, detail.id, detail.created_at
                    )?;
                    if detail.images.is_empty() {
                        writeln!(out, "  no images")?;
                    }
                    for image in &detail.images {
                        let size = match (image.width, image.height) {
                            (Some(w), Some(h)) => format!(" {w}x{h}"),
                            _ => String::new(),
                        };
                        writeln!(
                            out,
                            "  {:>4}  {}{size}",
                            image.id,
                            self.studio.client().media_url(&image.url)
                        )?;
                    }
                }
                None => writeln!(out, "no project selected")?,
            },
            ProjectAction::Rename { title } => {
                if self.studio.current_project().is_none() {
                    return writeln!(out, "select a project first");
                }
                let title = title.join(" ");
                if title.trim().is_empty() {
                    return writeln!(out, "title cannot be blank");
                }
                self.studio.rename_current_project(&title);
                if let Some(project) = self.studio.current_project() {
                    if project.title == title {
                        writeln!(out, "renamed project {} to {}", project.id, project.title)?;
                    }
                }
            }
            ProjectAction::Delete => {
                let Some(id) = self.studio.current_project().map(|p| p.id) else {
                    return writeln!(out, "select a project first");
                };
                self.studio.delete_current_project();
                if self.studio.current_project().is_none() {
                    writeln!(out, "deleted project {id}")?;
                }
            }
        }
        Ok(())
    }

    fn image<W: Write>(&mut self, action: ImageAction, out: &mut W) -> io::Result<()> {
        if !self.studio.is_signed_in() {
            return writeln!(out, "log in first");
        }
        match action {
            ImageAction::Show { id } => match self.studio.fetch_image(id) {
                Some(image) => {
                    writeln!(out, "{}", self.studio.client().media_url(&image.url))?;
                    if let (Some(w), Some(h)) = (image.width, image.height) {
                        writeln!(out, "  size: {w}x{h}")?;
                    }
                    writeln!(out, "  project: {}", image.project_id)
                }
                None => writeln!(out, "unknown image {id}"),
            },
            ImageAction::Delete { id } => {
                if self.studio.delete_image(id) {
                    writeln!(out, "deleted image {id}")?;
                }
                Ok(())
            }
        }
    }

    fn overlay<W: Write>(&mut self, coords: &[f64], out: &mut W) -> io::Result<()> {
        let points = match coords {
            [] => None,
            [x0, y0, x1, y1, x2, y2, x3, y3] => Some([
                Point::new(*x0, *y0),
                Point::new(*x1, *y1),
                Point::new(*x2, *y2),
                Point::new(*x3, *y3),
            ]),
            _ => return writeln!(out, "overlay takes no points or four x y pairs"),
        };
        if self.studio.pipeline().image_path.is_none() {
            return writeln!(out, "upload an image first");
        }
        if self.studio.selected_wheel().is_none() {
            return writeln!(out, "select a wheel first");
        }
        if !self.studio.is_signed_in() {
            return writeln!(out, "log in first");
        }
        let before = self.studio.pipeline().variant_path.clone();
        self.studio.overlay_wheel(points);
        self.print_new_variant(before, out)
    }

    fn print_new_variant<W: Write>(&self, before: Option<String>, out: &mut W) -> io::Result<()> {
        match &self.studio.pipeline().variant_path {
            Some(path) if Some(path) != before.as_ref() => {
                writeln!(out, "variant {}", self.studio.client().media_url(path))
            }
            _ => Ok(()),
        }
    }

    fn print_projects<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if !self.studio.is_signed_in() {
            return writeln!(out, "log in first");
        }
        if self.studio.projects().is_empty() {
            return writeln!(out, "no projects");
        }
        let current = self.studio.current_project().map(|p| p.id);
        for project in self.studio.projects() {
            let mark = if Some(project.id) == current { '*' } else { ' ' };
            writeln!(
                out,
                "{mark} {:>4}  {}  ({} images, created {})",
                project.id, project.title, project.image_count, project.created_at
            )?;
        }
        Ok(())
    }

    fn print_wheels<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.studio.wheels().is_empty() {
            return writeln!(out, "no wheels");
        }
        let selected = self.studio.selected_wheel().map(|w| w.id);
        for wheel in self.studio.wheels() {
            let mark = if Some(wheel.id) == selected { '*' } else { ' ' };
            writeln!(
                out,
                "{mark} {:>4}  {} {}  {}",
                wheel.id,
                wheel.brand,
                wheel.model,
                wheel.thumb_url.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    }

    fn print_display<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self.studio.display_image() {
            Some(DisplayImage::Remote(url)) => writeln!(out, "image {url}")?,
            Some(DisplayImage::Local(path)) => writeln!(out, "local {}", path.display())?,
            None => writeln!(out, "nothing to show")?,
        }
        if let Some(url) = self.studio.mask_url() {
            writeln!(out, "mask {url}")?;
        }
        let adjust = self.studio.pipeline().adjust;
        writeln!(out, "dh={} ds={} dv={}", adjust.dh, adjust.ds, adjust.dv)
    }
}
