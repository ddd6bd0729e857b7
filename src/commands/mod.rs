use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::*;

use crate::{
    chat::{self, Chat},
    config::Config,
    map::MapView,
    planner::{
        budget, ActivityId, Added, DestinationId, ItineraryOutcome, ManualDestination, NewActivity,
        ScheduleOverride, TripPlanner,
    },
    services::{geocoding, session, ApiClient},
    store::{AppState, SessionStore, StateStore},
    tracker::{self, TicketView},
    GenericError,
};

pub type CommandResult = Result<(), GenericError>;

#[derive(Debug, Parser)]
#[command(name = "wertigo", version, about = "Plan trips with the WerTigo travel assistant")]
pub struct Cli {
    /// Log everything the client does.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ask the travel assistant for places ("beaches in Boracay", "help").
    Chat {
        /// Only places rated at least this many stars.
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Add a recommended place, or one typed in by hand, to the trip.
    Add(AddArgs),
    /// Remove a destination from the trip.
    Remove { id: String },
    /// Plan or drop activities.
    #[command(subcommand)]
    Activity(ActivityCommand),
    /// Add another day to the planner.
    AddDay,
    /// Set who is travelling and when.
    Trip {
        #[arg(long)]
        travelers: Option<u32>,
        #[arg(long)]
        dates: Option<String>,
    },
    /// Look up coordinates for destinations that lack them.
    Geocode,
    /// Calculate the route through the trip's destinations.
    Route,
    /// Override the automatic schedule, or go back to it with --reset.
    Schedule(ScheduleArgs),
    /// Show the trip: days, schedule, activities and budget.
    Show,
    /// Ask the backend for a full itinerary of the trip.
    Itinerary,
    /// Save the trip and get a ticket id to retrieve it later.
    Ticket { email: String },
    /// Look up a saved trip by ticket id.
    Track {
        ticket_id: String,
        #[arg(long)]
        email: Option<String>,
        /// Also recompute the route through the itinerary.
        #[arg(long)]
        route: bool,
    },
    /// List the tickets saved for an e-mail address.
    Tickets { email: String },
    /// Write the trip (or a ticket) as GeoJSON.
    Map {
        #[arg(long)]
        ticket: Option<String>,
        #[arg(long, requires = "ticket")]
        email: Option<String>,
        /// File to write instead of printing.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Forget the current trip.
    Reset,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Position of a place in the last chat answer.
    #[arg(long, conflicts_with = "name")]
    pub pick: Option<usize>,
    #[arg(long, required_unless_present = "pick")]
    pub name: Option<String>,
    #[arg(long, default_value = "")]
    pub city: String,
    #[arg(long, default_value = "")]
    pub category: String,
    #[arg(long)]
    pub budget: Option<f64>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ActivityCommand {
    Add {
        #[arg(long, default_value_t = 1)]
        day: u32,
        name: String,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long)]
        notes: Option<String>,
    },
    Remove { id: String },
}

#[derive(Debug, Args)]
pub struct ScheduleArgs {
    #[arg(long, conflicts_with_all = ["days", "per_day", "auto_routing"])]
    pub reset: bool,
    #[arg(long)]
    pub days: Option<u32>,
    #[arg(long)]
    pub per_day: Option<u32>,
    #[arg(long)]
    pub auto_routing: Option<bool>,
}

/// Shared handles for one invocation.
pub struct Context {
    pub config: Config,
    pub api: ApiClient,
    pub state: StateStore,
    pub sessions: SessionStore,
}

impl Context {
    pub fn new(config: Config) -> Result<Self, GenericError> {
        Ok(Context {
            api: ApiClient::new(&config)?,
            state: StateStore::new(&config.state_dir),
            sessions: SessionStore::new(&config.state_dir),
            config,
        })
    }

    async fn load(&self) -> Result<AppState, GenericError> {
        let mut state = self.state.load().await?;
        state.planner.set_max_destinations(self.config.max_destinations);
        Ok(state)
    }
}

pub async fn run(ctx: &Context, command: Command) -> CommandResult {
    trace!("Running {command:?}");
    match command {
        Command::Track {
            ticket_id,
            email,
            route,
        } => return track(ctx, &ticket_id, email.as_deref(), route).await,
        Command::Tickets { email } => return tickets(ctx, &email).await,
        Command::Map {
            ticket: Some(ticket_id),
            email,
            output,
        } => return ticket_map(ctx, &ticket_id, email.as_deref(), output).await,
        _ => {}
    }

    let mut state = ctx.load().await?;
    match command {
        Command::Chat { rating, message } => chat(ctx, &mut state, &message.join(" "), rating).await?,
        Command::Add(args) => add(ctx, &mut state, args).await?,
        Command::Remove { id } => remove(&mut state.planner, &id)?,
        Command::Activity(command) => activity(ctx, &mut state.planner, command).await?,
        Command::AddDay => println!("Added day {}.", state.planner.add_day()),
        Command::Trip { travelers, dates } => {
            if let Some(travelers) = travelers {
                state.planner.set_travelers(travelers);
            }
            if dates.is_some() {
                state.planner.set_travel_dates(dates);
            }
            show(&state.planner);
        }
        Command::Geocode => geocode(ctx, &mut state.planner).await,
        Command::Route => route(ctx, &mut state.planner).await?,
        Command::Schedule(args) => schedule(&mut state.planner, args)?,
        Command::Show => show(&state.planner),
        Command::Itinerary => itinerary(ctx, &mut state.planner).await?,
        Command::Ticket { email } => ticket(ctx, &state.planner, &email).await?,
        Command::Map { output, .. } => write_map(&MapView::from_planner(&state.planner), output).await?,
        Command::Reset => {
            state.planner.reset();
            state.current_recommendations.clear();
            println!("Trip cleared.");
        }
        Command::Track { .. } | Command::Tickets { .. } => {}
    }
    ctx.state.save(&state).await
}

async fn chat(ctx: &Context, state: &mut AppState, message: &str, rating: Option<u8>) -> CommandResult {
    let session = if chat::is_help_command(message) {
        None
    } else {
        session::bootstrap(&ctx.api, &ctx.sessions).await
    };
    let chat = Chat::new(&ctx.api, session, ctx.config.recommendation_limit);
    let reply = chat.ask(message, rating).await;
    reply.remember(state);
    println!("{}", reply.render());
    Ok(())
}

async fn add(ctx: &Context, state: &mut AppState, args: AddArgs) -> CommandResult {
    let (name, added) = match args.pick {
        Some(pick) => {
            let (destination, added) = chat::add_pick(state, pick)?;
            (destination.name, added)
        }
        None => {
            let form = ManualDestination {
                name: args.name.unwrap_or_default(),
                city: args.city,
                category: args.category,
                budget: args.budget,
                notes: args.notes,
            };
            let name = form.name.trim().to_string();
            (name, state.planner.add_manual_destination(form)?)
        }
    };
    match added {
        Added::New(id) => {
            println!("Added {name} to your trip planner ({id}).");
            if state.planner.trip().auto_routing_enabled && state.planner.waypoints().len() >= 2 {
                if let Err(e) = state.planner.calculate_route(&ctx.api).await {
                    warn!("Auto-routing failed: {e}");
                }
            }
        }
        Added::Duplicate => println!("{name} is already in your trip planner."),
    }
    print_summary(&state.planner);
    Ok(())
}

fn remove(planner: &mut TripPlanner, id: &str) -> CommandResult {
    let removed = planner.remove_destination(&DestinationId::from(id))?;
    println!("Removed {} from your trip.", removed.name);
    print_summary(planner);
    Ok(())
}

async fn activity(ctx: &Context, planner: &mut TripPlanner, command: ActivityCommand) -> CommandResult {
    match command {
        ActivityCommand::Add {
            day,
            name,
            time,
            location,
            category,
            notes,
        } => {
            let form = NewActivity {
                day,
                name,
                time,
                location,
                category,
                notes,
            };
            let activity = planner.add_activity(form)?;
            let id = activity.id.clone();
            println!("Added {} on day {} ({id}).", activity.name, activity.day);
            if activity.location.is_some() {
                let geocoder = geocoding::geocoder(&ctx.api);
                if let Err(e) = planner.locate_activity(&id, &*geocoder).await {
                    warn!("Error geocoding activity location: {e}");
                }
            }
        }
        ActivityCommand::Remove { id } => {
            let removed = planner.remove_activity(&ActivityId::from(id.as_str()))?;
            println!("Removed {}.", removed.name);
        }
    }
    Ok(())
}

async fn geocode(ctx: &Context, planner: &mut TripPlanner) {
    let geocoder = geocoding::geocoder(&ctx.api);
    let located = planner.geocode_missing(&*geocoder).await;
    println!("Located {located} destination(s).");
}

async fn route(ctx: &Context, planner: &mut TripPlanner) -> CommandResult {
    let geocoder = geocoding::geocoder(&ctx.api);
    planner.geocode_missing(&*geocoder).await;
    match planner.calculate_route(&ctx.api).await? {
        Some(route) => println!(
            "Route: {:.1} km, {} through {} stops.",
            route.distance_km,
            tracker::format_travel_time(route.time_min),
            route.waypoints.len()
        ),
        None => println!("Add at least two destinations with known locations to calculate a route."),
    }
    print_summary(planner);
    Ok(())
}

fn schedule(planner: &mut TripPlanner, args: ScheduleArgs) -> CommandResult {
    if args.reset {
        planner.reset_schedule();
    } else {
        planner.apply_schedule(ScheduleOverride {
            days: args.days,
            destinations_per_day: args.per_day,
            auto_routing: args.auto_routing,
        })?;
    }
    show(planner);
    Ok(())
}

fn print_summary(planner: &TripPlanner) {
    let stats = planner.stats();
    println!(
        "{} destination(s), {} day(s), {} activity(ies), budget {}",
        stats.destinations,
        stats.days,
        stats.activities,
        budget::format_peso(stats.total_budget)
    );
}

fn show(planner: &TripPlanner) {
    let trip = planner.trip();
    if trip.selected_destinations.is_empty() && planner.activities().is_empty() {
        println!("Your trip is empty. Ask the assistant for places with `wertigo chat`.");
        return;
    }
    println!("Trip to {} for {} traveler(s)", trip.destination, trip.travelers);
    if let Some(dates) = &trip.travel_dates {
        println!("Dates: {dates}");
    }
    if let Some(route) = &trip.route_info {
        println!(
            "Route: {:.1} km, {}",
            route.distance_km,
            tracker::format_travel_time(route.time_min)
        );
    }
    for day in &trip.daily_schedule {
        println!("\nDay {}", day.day);
        for visit in &day.schedule {
            let id = visit
                .destination
                .id
                .as_ref()
                .map(DestinationId::as_str)
                .unwrap_or("-");
            println!(
                "  {}-{}  {} [{}]",
                visit.start_time, visit.end_time, visit.destination.name, id
            );
        }
    }
    let activities = planner.activities();
    if !activities.is_empty() {
        println!("\nActivities");
        for activity in activities {
            println!(
                "  Day {}  {}  {} @ {} [{}]",
                activity.day,
                activity.display_time(),
                activity.name,
                activity.display_location(),
                activity.id
            );
        }
    }

    let breakdown = &trip.budget_breakdown;
    println!("\nBudget {}", trip.budget);
    for (label, amount) in [
        ("Accommodation", breakdown.accommodation),
        ("Food", breakdown.food),
        ("Activities", breakdown.activities),
        ("Transportation", breakdown.transportation),
        ("Other", breakdown.other),
    ] {
        if !amount.is_zero() {
            println!("  {label}: {}", budget::format_peso(amount));
        }
    }
}

async fn itinerary(ctx: &Context, planner: &mut TripPlanner) -> CommandResult {
    let geocoder = geocoding::geocoder(&ctx.api);
    match planner.create_itinerary(&ctx.api, &*geocoder).await? {
        ItineraryOutcome::Created(trip) => {
            for day in &trip.itinerary {
                println!("\nDay {}", day.day);
                for place in &day.places {
                    println!("  - {}", place.name);
                }
                for meal in &day.meals {
                    println!("  {}: {}", meal.kind, meal.suggestion.as_deref().unwrap_or("-"));
                }
            }
            println!("\nSave it with `wertigo ticket <email>`.");
        }
        ItineraryOutcome::Suggestions(names) => {
            println!("I couldn't find that destination. Did you mean one of these?");
            for name in names {
                println!("  - {name}");
            }
        }
    }
    Ok(())
}

async fn ticket(ctx: &Context, planner: &TripPlanner, email: &str) -> CommandResult {
    let id = planner.save_ticket(&ctx.api, email).await?;
    println!("Your trip has been saved! Ticket ID: {id}");
    println!("Retrieve it any time with `wertigo track {id}`.");
    Ok(())
}

async fn track(ctx: &Context, ticket_id: &str, email: Option<&str>, with_route: bool) -> CommandResult {
    let view = tracker::lookup(&ctx.api, ticket_id, email).await?;
    let route = if with_route {
        match tracker::route(&ctx.api, &view).await {
            Ok(route) => Some(route),
            Err(e) => {
                warn!("Could not calculate ticket route: {e}");
                None
            }
        }
    } else {
        None
    };
    print!("{}", view.render(route.as_ref()));
    Ok(())
}

async fn tickets(ctx: &Context, email: &str) -> CommandResult {
    let views: Vec<TicketView> = tracker::list(&ctx.api, email).await?;
    for view in views {
        println!("{}", view.summary());
    }
    Ok(())
}

async fn ticket_map(
    ctx: &Context,
    ticket_id: &str,
    email: Option<&str>,
    output: Option<PathBuf>,
) -> CommandResult {
    let view = tracker::lookup(&ctx.api, ticket_id, email).await?;
    let route = match tracker::route(&ctx.api, &view).await {
        Ok(route) => Some(route),
        Err(e) => {
            debug!("Ticket map without route: {e}");
            None
        }
    };
    write_map(&MapView::from_ticket(&view, route.as_ref()), output).await
}

async fn write_map(map: &MapView, output: Option<PathBuf>) -> CommandResult {
    let json = serde_json::to_string_pretty(&map.to_geojson())?;
    match output {
        Some(path) => {
            tokio::fs::write(&path, json).await?;
            info!("Wrote map to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
