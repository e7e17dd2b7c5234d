use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use unifyr::Unifyr;
use unifyr::error::{Error, Feedback, Result};
use unifyr::order::{
    OrderForm, OrderPatch, SortKey, Status, StatusFilter, filter_by_status,
    invoice_totals, sort_by, summary, text_filename, track,
};
use unifyr::profile::Avatar;
use unifyr::user::{ChangePasswordForm, PasswordStrength, RegisterForm, Role};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Create an account and log in.
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Print the current session.
    Whoami,
    /// Change the password of the logged-in account.
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
    /// Rate a password without storing it.
    Strength { password: String },
    /// Show or edit the profile.
    Profile {
        #[command(subcommand)]
        cmd: Option<ProfileCommands>,
    },
    Order {
        #[command(subcommand)]
        cmd: OrderCommands,
    },
    Admin {
        #[command(subcommand)]
        cmd: AdminCommands,
    },
    /// Ask for a password reset link.
    ResetPassword { email: String },
}

#[derive(Subcommand, Debug, Clone)]
enum ProfileCommands {
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        /// Image file to use as profile picture.
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum OrderCommands {
    /// Place an order, priced from its service fields.
    Create {
        /// printing, food, recruitment or real-estate.
        #[arg(long)]
        service: String,
        #[arg(long)]
        print_type: Option<String>,
        #[arg(long)]
        quantity: Option<String>,
        #[arg(long)]
        material: Option<String>,
        #[arg(long)]
        meal_count: Option<String>,
        #[arg(long)]
        delivery_time: Option<String>,
        #[arg(long)]
        positions: Option<String>,
        #[arg(long)]
        salary_range: Option<String>,
        #[arg(long)]
        property_type: Option<String>,
        #[arg(long)]
        budget: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List own orders with dashboard counters.
    List {
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        #[arg(long, default_value = "date-desc")]
        sort: SortKey,
    },
    Show { id: String },
    /// Write the invoice of an order.
    Invoice {
        id: String,
        /// Export the paginated layout instead of the text receipt.
        #[arg(long)]
        layout: bool,
        /// Output directory.
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Write the text invoices of every order matching `--status`.
    Invoices {
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Only print the totals.
        #[arg(long)]
        dry_run: bool,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Progress of pending and in-progress orders.
    Track,
}

#[derive(Subcommand, Debug, Clone)]
enum AdminCommands {
    Stats,
    Orders {
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        #[arg(long, default_value = "date-desc")]
        sort: SortKey,
    },
    /// Edit status, price or type of an order.
    Edit {
        id: String,
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long = "type")]
        kind: Option<String>,
    },
    Users {
        #[arg(long)]
        role: Option<Role>,
    },
    Role { user_id: String, role: Role },
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| Error::internal("cannot encode output", err))?;
    println!("{json}");
    Ok(())
}

fn run(app: &Unifyr, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Signup {
            name,
            email,
            password,
            confirm,
        } => print(&app.accounts().register(RegisterForm {
            name,
            email,
            password,
            confirm_password: confirm,
        })?),
        Commands::Login { email, password } => {
            print(&app.accounts().authenticate(&email, &password)?)
        },
        Commands::Logout => app.logout(),
        Commands::Whoami => print(&app.require_session()?),
        Commands::Password {
            current,
            new,
            confirm,
        } => {
            app.accounts().change_password(ChangePasswordForm {
                current_password: current,
                new_password: new,
                confirm_password: confirm,
            })?;
            println!("Password updated.");
            Ok(())
        },
        Commands::Strength { password } => {
            match PasswordStrength::measure(&password) {
                Some(strength) => println!("{strength:?}"),
                None => println!("Empty"),
            }
            Ok(())
        },
        Commands::Profile { cmd: None } => print(&app.accounts().profile()?),
        Commands::Profile {
            cmd:
                Some(ProfileCommands::Set {
                    name,
                    phone,
                    address,
                    city,
                    country,
                    bio,
                    avatar,
                }),
        } => {
            let mut profile = app.accounts().profile()?;
            for (field, value) in [
                (&mut profile.name, name),
                (&mut profile.phone, phone),
                (&mut profile.address, address),
                (&mut profile.city, city),
                (&mut profile.country, country),
                (&mut profile.bio, bio),
            ] {
                if let Some(value) = value {
                    *field = value;
                }
            }
            if let Some(path) = avatar {
                profile.profile_picture = Some(Avatar::from_file(path)?);
            }

            app.accounts().update_profile(profile.clone())?;
            print(&profile)
        },
        Commands::Order { cmd } => order(app, cmd),
        Commands::Admin { cmd } => admin(app, cmd),
        Commands::ResetPassword { email } => {
            app.accounts().request_password_reset(&email)?;
            println!("If an account exists for {email}, a reset link is on its way.");
            Ok(())
        },
    }
}

fn order(app: &Unifyr, cmd: OrderCommands) -> Result<()> {
    let session = app.require_session()?;

    match cmd {
        OrderCommands::Create {
            service,
            print_type,
            quantity,
            material,
            meal_count,
            delivery_time,
            positions,
            salary_range,
            property_type,
            budget,
            description,
        } => {
            let form = OrderForm {
                service,
                print_type,
                quantity,
                material,
                meal_count,
                delivery_time,
                positions,
                salary_range,
                property_type,
                budget,
                description,
            };
            print(&app.orders().create(&session, &form)?)
        },
        OrderCommands::List { status, sort } => {
            let orders = app.orders().list_for_user(&session.id)?;

            #[derive(Serialize)]
            #[serde(rename_all = "camelCase")]
            struct Listing<T, U> {
                summary: T,
                orders: U,
            }

            print(&Listing {
                summary: summary(&orders),
                orders: sort_by(&filter_by_status(&orders, status), sort),
            })
        },
        OrderCommands::Show { id } => print(&app.orders().find(&session, &id)?),
        OrderCommands::Invoice { id, layout, out } => {
            let order = app.orders().find(&session, &id)?;
            let (path, contents) = if layout {
                let document = app.invoices().render_layout(&order);
                let json = serde_json::to_string_pretty(&document)
                    .map_err(|err| Error::internal("cannot encode invoice", err))?;
                // The layout is exported as JSON next to its final name.
                (out.join(format!("{}.json", document.filename)), json)
            } else {
                (
                    out.join(text_filename(&order)),
                    app.invoices().render_text(&order),
                )
            };

            std::fs::write(&path, contents)
                .map_err(|err| Error::internal("cannot write invoice", err))?;
            println!("{}", path.display());
            Ok(())
        },
        OrderCommands::Invoices {
            status,
            dry_run,
            out,
        } => {
            let orders = app.orders().list_for_user(&session.id)?;
            let selected = filter_by_status(&orders, status);

            if !dry_run {
                for receipt in app.invoices().render_all(&selected) {
                    let path = out.join(&receipt.filename);
                    std::fs::write(&path, receipt.contents).map_err(|err| {
                        Error::internal("cannot write invoice", err)
                    })?;
                    println!("{}", path.display());
                }
            }

            print(&invoice_totals(&orders))
        },
        OrderCommands::Track => {
            let orders = app.orders().list_for_user(&session.id)?;
            print(&track(&orders))
        },
    }
}

fn admin(app: &Unifyr, cmd: AdminCommands) -> Result<()> {
    let session = app.require_session()?;

    match cmd {
        AdminCommands::Stats => print(&app.orders().stats(&session)?),
        AdminCommands::Orders { status, sort } => {
            let orders = app.orders().list_all(&session)?;
            print(&sort_by(&filter_by_status(&orders, status), sort))
        },
        AdminCommands::Edit {
            id,
            status,
            price,
            kind,
        } => print(&app.orders().update(&session, &id, OrderPatch {
            status,
            price,
            kind,
        })?),
        AdminCommands::Users { role } => {
            let users = app.accounts().list_users(role)?;
            let sessions: Vec<_> =
                users.iter().map(unifyr::session::Session::from).collect();
            print(&sessions)
        },
        AdminCommands::Role { user_id, role } => {
            let user = app.accounts().set_role(&user_id, role)?;
            print(&unifyr::session::Session::from(&user))
        },
    }
}

fn main() -> ExitCode {
    unifyr::telemetry::setup_logging(None);

    let args = Args::parse();
    let app = match Unifyr::initialize() {
        Ok(app) => app,
        Err(err) => {
            tracing::error!(error = %err, "cannot start");
            return ExitCode::FAILURE;
        },
    };

    match run(&app, args.cmd) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let feedback = Feedback::from(&err);
            eprintln!("{}: {}", feedback.title, feedback.detail);
            for field in &feedback.errors {
                eprintln!("  {}: {}", field.field, field.message);
            }
            ExitCode::FAILURE
        },
    }
}
