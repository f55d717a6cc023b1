//! Command-line front end: one protocol phase per invocation.
//!
//! Every command takes the pairing configuration file as its first argument
//! and writes its outputs into the configured output directory.

use std::env;
use std::io::{BufReader, IsTerminal};
use std::process;

use idpdp::keys::key_file_stem;
use idpdp::store::{
    self, CHALLENGE_FILE, FILE_INFO_FILE, FULL_KEY_SUFFIX, MASTER_SECRET_FILE, PARAMS_FILE,
    PARTIAL_KEY_SUFFIX, PROOF_FILE, PUBLIC_KEY_SUFFIX, Staging, TAGS_FILE,
};
use idpdp::{
    AlgebraicContext, Challenge, Config, Error, FileMetadata, FullPrivateKey, MasterSecretKey,
    PartialKey, Proof, PublicKey, PublicParameters, Result, TagGenerator, full_key_gen,
    generate_proof, partial_key_gen, setup, verify_proof,
};
use rand::rngs::OsRng;
use tracing::{error, info};

const USAGE: &str = "Usage: idpdp <command> <pairing config> [args...]
  setup
  partialKeyGen <MSK file> <ID>
  fullKeyGen <params file> <partial private key file> <ID>
  tagGen <csp full private key file> <auditee public key file> <input file>
  chalGen <ratio>
  proofGen <auditee full private key file> <csp public key file> <input file> <tags file> <challenge file>
  verifyProof <csp public key file> <auditee public key file> <proof file> <csp ID> <params file> <challenge file> <file info file>";

fn fatal(message: &str) -> ! {
    eprintln!("{message}");
    process::exit(1);
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 {
        fatal(USAGE);
    }
    let command = args[0].as_str();
    let rest = &args[2..];

    let config = Config::load(&args[1]).unwrap_or_else(|err| fatal(&err.to_string()));
    let level = config.level().unwrap_or_else(|err| fatal(&err.to_string()));
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();

    let ctx = AlgebraicContext::new(&config).unwrap_or_else(|err| fatal(&err.to_string()));

    let outcome = match command {
        "setup" => cmd_setup(&config),
        "partialKeyGen" => cmd_partial_key_gen(&config, &ctx, expect_args(rest, 2)),
        "fullKeyGen" => cmd_full_key_gen(&config, &ctx, expect_args(rest, 3)),
        "tagGen" => cmd_tag_gen(&config, &ctx, expect_args(rest, 3)),
        "chalGen" => cmd_chal_gen(&config, expect_args(rest, 1)),
        "proofGen" => cmd_proof_gen(&config, &ctx, expect_args(rest, 5)),
        "verifyProof" => cmd_verify_proof(&config, &ctx, expect_args(rest, 7)),
        _ => fatal(&format!("Incorrect command {command:?}\n{USAGE}")),
    };

    if let Err(err) = outcome {
        error!(command, "{err}");
        process::exit(1);
    }
}

fn expect_args(rest: &[String], count: usize) -> &[String] {
    if rest.len() < count {
        fatal(USAGE);
    }
    &rest[..count]
}

fn cmd_setup(config: &Config) -> Result<()> {
    let (msk, params) = setup(&mut OsRng);
    let mut staging = Staging::new();
    staging.stage_bytes(config.output_path(MASTER_SECRET_FILE), &msk.to_bytes())?;
    staging.stage_bytes(config.output_path(PARAMS_FILE), &params.to_bytes())?;
    staging.commit()?;
    info!("setup done: {MASTER_SECRET_FILE} and {PARAMS_FILE} generated");
    Ok(())
}

fn cmd_partial_key_gen(config: &Config, ctx: &AlgebraicContext, args: &[String]) -> Result<()> {
    let (msk_path, identity) = (&args[0], &args[1]);
    let msk = store::load(msk_path, MasterSecretKey::from_bytes)?;

    let partial = partial_key_gen(ctx, &msk, identity);
    let name = format!("{}{PARTIAL_KEY_SUFFIX}", key_file_stem(identity));
    store::write_bytes(config.output_path(&name), &partial.to_bytes())?;
    info!(identity = identity.as_str(), "partial private key written to {name}");
    Ok(())
}

fn cmd_full_key_gen(config: &Config, ctx: &AlgebraicContext, args: &[String]) -> Result<()> {
    let (params_path, partial_path, identity) = (&args[0], &args[1], &args[2]);
    let params = store::load(params_path, PublicParameters::from_bytes)?;
    let partial = store::load(partial_path, PartialKey::from_bytes)?;

    let pair = full_key_gen(ctx, &params, &partial, identity, &mut OsRng)?;
    let stem = key_file_stem(identity);
    let mut staging = Staging::new();
    staging.stage_bytes(
        config.output_path(&format!("{stem}{FULL_KEY_SUFFIX}")),
        &pair.secret.to_bytes(),
    )?;
    staging.stage_bytes(
        config.output_path(&format!("{stem}{PUBLIC_KEY_SUFFIX}")),
        &pair.public.to_bytes(),
    )?;
    staging.commit()?;
    info!(identity = identity.as_str(), "full key pair generated");
    Ok(())
}

fn cmd_tag_gen(config: &Config, ctx: &AlgebraicContext, args: &[String]) -> Result<()> {
    let (csp_key_path, owner_key_path, input) = (&args[0], &args[1], &args[2]);
    FileMetadata::check_identifier(input)?;
    let csp_key = store::load(csp_key_path, FullPrivateKey::from_bytes)?;
    let owner = store::load(owner_key_path, PublicKey::from_bytes)?;

    let file = BufReader::new(store::open(input)?);
    let generator = TagGenerator::new(ctx, input, &csp_key, &owner);
    let mut staging = Staging::new();
    let block_count = staging.stage(config.output_path(TAGS_FILE), |sink| {
        generator.generate(file, sink)
    })?;

    let metadata = FileMetadata::new(input.as_str(), block_count)?;
    staging.stage_bytes(config.output_path(FILE_INFO_FILE), metadata.to_text().as_bytes())?;
    staging.commit()?;
    info!(block_count, "tags saved to {TAGS_FILE}, metadata to {FILE_INFO_FILE}");
    Ok(())
}

fn cmd_chal_gen(config: &Config, args: &[String]) -> Result<()> {
    let ratio: f64 = args[0]
        .trim()
        .parse()
        .map_err(|_| Error::malformed(format!("ratio {:?} is not a number", args[0])))?;
    let challenge = Challenge::generate(ratio, &mut OsRng)?;
    store::write_bytes(config.output_path(CHALLENGE_FILE), &challenge.to_bytes())?;
    info!(ratio = challenge.ratio(), "challenge written to {CHALLENGE_FILE}");
    Ok(())
}

fn cmd_proof_gen(config: &Config, ctx: &AlgebraicContext, args: &[String]) -> Result<()> {
    let (owner_key_path, csp_key_path, input, tags_path, challenge_path) =
        (&args[0], &args[1], &args[2], &args[3], &args[4]);
    let owner_key = store::load(owner_key_path, FullPrivateKey::from_bytes)?;
    let csp_public = store::load(csp_key_path, PublicKey::from_bytes)?;
    let challenge = store::load(challenge_path, Challenge::from_bytes)?;

    let block_count = ctx.block_count(store::file_size(input)?);
    let proof = generate_proof(
        ctx,
        BufReader::new(store::open(input)?),
        block_count,
        store::open(tags_path)?,
        &challenge,
        owner_key.beta(),
        &csp_public,
    )?;
    store::write_bytes(config.output_path(PROOF_FILE), &proof.to_bytes())?;
    info!("proof saved to {PROOF_FILE}");
    Ok(())
}

fn cmd_verify_proof(config: &Config, ctx: &AlgebraicContext, args: &[String]) -> Result<()> {
    let csp_public = store::load(&args[0], PublicKey::from_bytes)?;
    let owner_public = store::load(&args[1], PublicKey::from_bytes)?;
    let proof = store::load(&args[2], Proof::from_bytes)?;
    let csp_identity = &args[3];
    let params = store::load(&args[4], PublicParameters::from_bytes)?;
    let challenge = store::load(&args[5], Challenge::from_bytes)?;
    let metadata = FileMetadata::from_text(&store::read_text(&args[6])?)?;

    let accepted = verify_proof(
        ctx,
        &params,
        &csp_public,
        &owner_public,
        &proof,
        csp_identity,
        &challenge,
        &metadata,
    )?;

    match (config.plain_result, accepted) {
        (true, true) => println!("1"),
        (true, false) => println!("0"),
        (false, true) => println!("Verification Successful!"),
        (false, false) => println!("Verification Failed!"),
    }
    Ok(())
}
