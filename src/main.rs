use clap::{value_parser, Arg, ArgMatches, Command};
use rustdrp::{
    core::config::{AppConfig, DEFAULT_CONFIG_PATH},
    core::error::RiskError,
    core::types::{Feature, PatientInput},
    model::LoadedModel,
    risk::RiskEvaluator,
    utils::init_logger,
    web::{serve, AppState},
};
use std::sync::Arc;

fn cli() -> Command {
    let feature_arg = |id: &'static str, long: &'static str, default: &'static str| {
        Arg::new(id)
            .long(long)
            .value_name("VALUE")
            .value_parser(value_parser!(f64))
            .default_value(default)
    };

    Command::new("RustDRP")
        .version(env!("CARGO_PKG_VERSION"))
        .about("糖尿病风险预测服务")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径")
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("PATH")
                .help("模型文件路径（覆盖配置）"),
        )
        .subcommand(
            Command::new("serve")
                .about("启动表单页面与接口（默认）")
                .arg(Arg::new("host").long("host").value_name("HOST"))
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .value_parser(value_parser!(u16)),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("对单组输入做一次评估")
                .arg(feature_arg("glucose", "glucose", "100"))
                .arg(feature_arg("blood_pressure", "blood-pressure", "80"))
                .arg(feature_arg("insulin", "insulin", "80"))
                .arg(feature_arg("bmi", "bmi", "25.0"))
                .arg(feature_arg("age", "age", "30")),
        )
}

fn load_model(config: &AppConfig) -> Result<Arc<LoadedModel>, RiskError> {
    LoadedModel::load(&config.model.path).map(Arc::new)
}

async fn run_serve(mut config: AppConfig, args: Option<&ArgMatches>) -> Result<(), RiskError> {
    if let Some(args) = args {
        if let Some(host) = args.get_one::<String>("host") {
            config.server.host = host.clone();
        }
        if let Some(port) = args.get_one::<u16>("port") {
            config.server.port = *port;
        }
    }

    let _log_handle = init_logger(&config.logging)?;
    log::info!(
        "启动 RustDRP v{}, 模型: {}, 阈值: {:.2} / {:.2}",
        env!("CARGO_PKG_VERSION"),
        config.model.path,
        config.thresholds.pre_diabetic,
        config.thresholds.diabetic
    );

    // 模型加载失败时不监听端口
    let model = load_model(&config)?;
    let evaluator = RiskEvaluator::new(model, config.thresholds);
    let state = AppState::new(evaluator, config.page.clone());

    serve(&config.server.bind_addr(), state).await
}

fn run_predict(mut config: AppConfig, args: &ArgMatches) -> Result<(), RiskError> {
    // 控制台只输出结果
    config.logging.console_output = false;
    let _log_handle = init_logger(&config.logging)?;

    let mut input = PatientInput::default();
    for feature in Feature::ALL {
        if let Some(value) = args.get_one::<f64>(feature.name()) {
            input.set(feature, feature.spec().normalize(*value));
        }
    }

    let evaluator = RiskEvaluator::new(load_model(&config)?, config.thresholds);
    let result = evaluator.evaluate(&input)?;

    println!("{}", result.summary());
    println!("category: {:?}", result.category);
    println!("position: {:.1}", result.position);
    if let Some(p) = result.probability {
        println!("probability: {:.4}", p);
    }
    Ok(())
}

async fn run(matches: ArgMatches) -> Result<(), RiskError> {
    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);
    let mut config = AppConfig::load(config_path)?;
    if let Some(model) = matches.get_one::<String>("model") {
        config.model.path = model.clone();
    }

    match matches.subcommand() {
        Some(("predict", args)) => run_predict(config, args),
        Some(("serve", args)) => run_serve(config, Some(args)).await,
        _ => run_serve(config, None).await,
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    if let Err(e) = run(matches).await {
        e.log("❌ 运行失败");
        eprintln!("{}", e.user_friendly_message());
        std::process::exit(1);
    }
}
