//! Builtin tool catalog
//!
//! The seven utility tools the assistant ships with: BMI, weather lookup,
//! quotes, compound interest, password generation, temperature conversion,
//! and tip calculation. [`default_registry`] registers them in a fixed
//! order so the catalog the model sees is deterministic.
//!
//! Handlers assume the registry has already validated and defaulted their
//! arguments; domain guards (negative weights, bad units) stay in the
//! handlers and surface as `execution_error` results.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::{Map, Value, json};

use crate::error::Result;

use super::definition::{ParamSpec, ParamType, ToolDefinition};
use super::registry::{HandlerResult, ToolHandler, ToolRegistry};

const QUOTES: &[&str] = &[
    "The only way to do great work is to love what you do. - Steve Jobs",
    "Innovation distinguishes between a leader and a follower. - Steve Jobs",
    "Life is what happens to you while you're busy making other plans. - John Lennon",
    "The future belongs to those who believe in the beauty of their dreams. - Eleanor Roosevelt",
    "It is during our darkest moments that we must focus to see the light. - Aristotle",
    "Success is not final, failure is not fatal: it is the courage to continue that counts. - Winston Churchill",
    "The only impossible journey is the one you never begin. - Tony Robbins",
];

/// (city, temp °C, condition, humidity %)
const WEATHER_DATA: &[(&str, i64, &str, i64)] = &[
    ("New York", 22, "Sunny", 65),
    ("London", 15, "Cloudy", 78),
    ("Tokyo", 28, "Partly Cloudy", 70),
    ("Sydney", 25, "Rainy", 85),
    ("Paris", 18, "Overcast", 72),
];

const CONDITIONS: &[&str] = &["Sunny", "Cloudy", "Rainy", "Partly Cloudy", "Overcast"];

const PASSWORD_SYMBOLS: &str = "!@#$%^&*";

/// Build the registry with all builtin tools, in catalog order.
pub fn default_registry() -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(calculate_bmi_definition(), handler(calculate_bmi))?;
    registry.register(get_weather_definition(), handler(get_weather))?;
    registry.register(get_random_quote_definition(), handler(get_random_quote))?;
    registry.register(
        calculate_compound_interest_definition(),
        handler(calculate_compound_interest),
    )?;
    registry.register(generate_password_definition(), handler(generate_password))?;
    registry.register(convert_temperature_definition(), handler(convert_temperature))?;
    registry.register(calculate_tip_definition(), handler(calculate_tip))?;
    Ok(registry)
}

/// Adapt a plain async fn into the boxed handler type the registry stores
fn handler<F, Fut>(f: F) -> ToolHandler
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |args| Box::pin(f(args)))
}

fn calculate_bmi_definition() -> ToolDefinition {
    ToolDefinition::new("calculate_bmi", "Calculate Body Mass Index (BMI) from weight and height")
        .with_param(ParamSpec::required("weight", ParamType::Number).with_description("Weight in kilograms"))
        .with_param(ParamSpec::required("height", ParamType::Number).with_description("Height in meters"))
}

async fn calculate_bmi(args: Map<String, Value>) -> HandlerResult {
    let weight = require_f64(&args, "weight")?;
    let height = require_f64(&args, "height")?;

    if weight <= 0.0 || height <= 0.0 {
        return Err("Weight and height must be positive values".to_string());
    }

    let bmi = weight / (height * height);
    let category = if bmi < 18.5 {
        "Underweight"
    } else if bmi < 25.0 {
        "Normal weight"
    } else if bmi < 30.0 {
        "Overweight"
    } else {
        "Obese"
    };

    Ok(json!({
        "bmi": round2(bmi),
        "category": category,
        "weight": weight,
        "height": height,
    }))
}

fn get_weather_definition() -> ToolDefinition {
    ToolDefinition::new("get_weather", "Get weather information for a specified city").with_param(
        ParamSpec::optional("city", ParamType::String)
            .with_default("New York")
            .with_description("Name of the city"),
    )
}

async fn get_weather(args: Map<String, Value>) -> HandlerResult {
    let city = title_case(require_str(&args, "city")?);
    let timestamp = Utc::now().to_rfc3339();

    if let Some((name, temp, condition, humidity)) = WEATHER_DATA.iter().find(|(name, ..)| *name == city) {
        return Ok(json!({
            "city": name,
            "temp": temp,
            "condition": condition,
            "humidity": humidity,
            "timestamp": timestamp,
        }));
    }

    // Unknown city: simulate a plausible reading
    let mut rng = rand::thread_rng();
    Ok(json!({
        "city": city,
        "temp": rng.gen_range(10..=35),
        "condition": CONDITIONS.choose(&mut rng).copied().unwrap_or("Sunny"),
        "humidity": rng.gen_range(40..=90),
        "timestamp": timestamp,
        "note": "Simulated data for unknown city",
    }))
}

fn get_random_quote_definition() -> ToolDefinition {
    ToolDefinition::new("get_random_quote", "Get a random inspirational quote")
}

async fn get_random_quote(_args: Map<String, Value>) -> HandlerResult {
    let quote = QUOTES.choose(&mut rand::thread_rng()).copied().unwrap_or(QUOTES[0]);
    Ok(json!({
        "quote": quote,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

fn calculate_compound_interest_definition() -> ToolDefinition {
    ToolDefinition::new("calculate_compound_interest", "Calculate compound interest")
        .with_param(ParamSpec::required("principal", ParamType::Number).with_description("Initial amount"))
        .with_param(
            ParamSpec::required("rate", ParamType::Number).with_description("Annual interest rate as a percentage"),
        )
        .with_param(ParamSpec::required("time", ParamType::Number).with_description("Time period in years"))
        .with_param(
            ParamSpec::optional("compound_frequency", ParamType::Number)
                .with_default(1)
                .with_description("Times interest is compounded per year"),
        )
}

async fn calculate_compound_interest(args: Map<String, Value>) -> HandlerResult {
    let principal = require_f64(&args, "principal")?;
    let rate = require_f64(&args, "rate")?;
    let time = require_f64(&args, "time")?;
    let frequency = require_f64(&args, "compound_frequency")?.trunc();

    if principal <= 0.0 || rate < 0.0 || time < 0.0 || frequency <= 0.0 {
        return Err("Invalid input values".to_string());
    }

    let rate_decimal = rate / 100.0;
    let amount = principal * (1.0 + rate_decimal / frequency).powf(frequency * time);

    Ok(json!({
        "principal": principal,
        "rate": rate,
        "time": time,
        "compound_frequency": frequency as i64,
        "final_amount": round2(amount),
        "interest_earned": round2(amount - principal),
    }))
}

fn generate_password_definition() -> ToolDefinition {
    ToolDefinition::new("generate_password", "Generate a random password")
        .with_param(
            ParamSpec::optional("length", ParamType::Number)
                .with_default(12)
                .with_description("Length of the password"),
        )
        .with_param(
            ParamSpec::optional("include_symbols", ParamType::Boolean)
                .with_default(true)
                .with_description("Whether to include symbols"),
        )
}

async fn generate_password(args: Map<String, Value>) -> HandlerResult {
    let length = require_f64(&args, "length")?.trunc() as i64;
    let include_symbols = require_bool(&args, "include_symbols")?;

    if length < 4 {
        return Err("Password length must be at least 4 characters".to_string());
    }
    if length > 128 {
        return Err("Password length must be at most 128 characters".to_string());
    }

    let mut charset: Vec<char> = ('a'..='z').chain('A'..='Z').chain('0'..='9').collect();
    if include_symbols {
        charset.extend(PASSWORD_SYMBOLS.chars());
    }

    let mut rng = rand::thread_rng();
    let password: String = (0..length).map(|_| charset[rng.gen_range(0..charset.len())]).collect();

    let strength = if length >= 12 {
        "Strong"
    } else if length >= 8 {
        "Medium"
    } else {
        "Weak"
    };

    Ok(json!({
        "password": password,
        "length": length,
        "includes_symbols": include_symbols,
        "strength": strength,
    }))
}

fn convert_temperature_definition() -> ToolDefinition {
    ToolDefinition::new(
        "convert_temperature",
        "Convert temperature between Celsius, Fahrenheit, and Kelvin",
    )
    .with_param(ParamSpec::required("temperature", ParamType::Number).with_description("Temperature value"))
    .with_param(ParamSpec::required("from_unit", ParamType::String).with_description("Source unit (C, F, or K)"))
    .with_param(ParamSpec::required("to_unit", ParamType::String).with_description("Target unit (C, F, or K)"))
}

async fn convert_temperature(args: Map<String, Value>) -> HandlerResult {
    let temperature = require_f64(&args, "temperature")?;
    let from_unit = require_str(&args, "from_unit")?.to_uppercase();
    let to_unit = require_str(&args, "to_unit")?.to_uppercase();

    let valid = ["C", "F", "K"];
    if !valid.contains(&from_unit.as_str()) || !valid.contains(&to_unit.as_str()) {
        return Err("Units must be C (Celsius), F (Fahrenheit), or K (Kelvin)".to_string());
    }

    // Pivot through Celsius
    let celsius = match from_unit.as_str() {
        "F" => (temperature - 32.0) * 5.0 / 9.0,
        "K" => temperature - 273.15,
        _ => temperature,
    };
    let converted = match to_unit.as_str() {
        "F" => celsius * 9.0 / 5.0 + 32.0,
        "K" => celsius + 273.15,
        _ => celsius,
    };

    Ok(json!({
        "original_temperature": temperature,
        "original_unit": from_unit,
        "converted_temperature": round2(converted),
        "converted_unit": to_unit,
    }))
}

fn calculate_tip_definition() -> ToolDefinition {
    ToolDefinition::new("calculate_tip", "Calculate tip and split the bill among people")
        .with_param(ParamSpec::required("bill_amount", ParamType::Number).with_description("Total bill amount"))
        .with_param(
            ParamSpec::optional("tip_percentage", ParamType::Number)
                .with_default(15.0)
                .with_description("Tip percentage"),
        )
        .with_param(
            ParamSpec::optional("num_people", ParamType::Number)
                .with_default(1)
                .with_description("Number of people splitting the bill"),
        )
}

async fn calculate_tip(args: Map<String, Value>) -> HandlerResult {
    let bill_amount = require_f64(&args, "bill_amount")?;
    let tip_percentage = require_f64(&args, "tip_percentage")?;
    let num_people = require_f64(&args, "num_people")?.trunc();

    if bill_amount <= 0.0 || tip_percentage < 0.0 || num_people <= 0.0 {
        return Err("Invalid input values".to_string());
    }

    let tip_amount = bill_amount * (tip_percentage / 100.0);
    let total_amount = bill_amount + tip_amount;
    let per_person = total_amount / num_people;

    Ok(json!({
        "bill_amount": bill_amount,
        "tip_percentage": tip_percentage,
        "tip_amount": round2(tip_amount),
        "total_amount": round2(total_amount),
        "num_people": num_people as i64,
        "per_person": round2(per_person),
    }))
}

fn require_f64(args: &Map<String, Value>, name: &str) -> std::result::Result<f64, String> {
    args.get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| format!("missing numeric argument '{name}'"))
}

fn require_str<'a>(args: &'a Map<String, Value>, name: &str) -> std::result::Result<&'a str, String> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing string argument '{name}'"))
}

fn require_bool(args: &Map<String, Value>, name: &str) -> std::result::Result<bool, String> {
    args.get(name)
        .and_then(Value::as_bool)
        .ok_or_else(|| format!("missing boolean argument '{name}'"))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Uppercase the first letter of each word, lowercase the rest
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if word_start {
                out.extend(c.to_uppercase());
                word_start = false;
            } else {
                out.extend(c.to_lowercase());
            }
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}
