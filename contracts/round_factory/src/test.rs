extern crate std;

use soroban_sdk::{
    testutils::{Address as _, Events},
    vec, Address, BytesN, Env, IntoVal, String, Symbol, TryIntoVal,
};

use program_registry::{ProgramRegistry, ProgramRegistryClient};
use shared::{MetadataPointer, RoundParams, RoundSchedule};

use crate::{Error, ImplementationUpdated, RoundFactory, RoundFactoryClient};

fn setup() -> (Env, RoundFactoryClient<'static>, Address, Address) {
    let env = Env::default();
    env.mock_all_auths();

    let registry = env.register(ProgramRegistry, ());
    let factory = env.register(RoundFactory, ());
    let client = RoundFactoryClient::new(&env, &factory);
    let admin = Address::generate(&env);

    client.init(&admin, &registry, &BytesN::from_array(&env, &[0x11u8; 32]));
    (env, client, admin, registry)
}

fn meta(env: &Env, pointer: &str) -> MetadataPointer {
    MetadataPointer {
        protocol: 1,
        pointer: String::from_str(env, pointer),
    }
}

fn params(env: &Env, program_id: u64) -> RoundParams {
    let now = env.ledger().timestamp();
    RoundParams {
        token: Address::generate(env),
        schedule: RoundSchedule {
            apps_start: now + 100,
            apps_end: now + 250,
            round_start: now + 500,
            round_end: now + 1000,
        },
        voting_strategy: Address::generate(env),
        payout_strategy: Address::generate(env),
        round_meta: meta(env, "ipfs://round"),
        application_meta: meta(env, "ipfs://form"),
        projects_meta: meta(env, "ipfs://projects"),
        program_id,
        admins: vec![env, Address::generate(env)],
        operators: vec![env],
    }
}

#[test]
fn init_is_one_shot() {
    let (env, client, admin, registry) = setup();
    assert_eq!(
        client.try_init(&admin, &registry, &BytesN::from_array(&env, &[0x22u8; 32])),
        Err(Ok(Error::AlreadyInitialized.into()))
    );
}

#[test]
fn create_round_rejects_unknown_program() {
    let (env, client, admin, _registry) = setup();
    let salt = BytesN::from_array(&env, &[1u8; 32]);

    // No program was ever registered; the reference is dangling.
    assert_eq!(
        client.try_create_round(&admin, &params(&env, 0), &salt),
        Err(Ok(Error::ProgramNotFound.into()))
    );
}

#[test]
fn create_round_before_init_fails() {
    let env = Env::default();
    env.mock_all_auths();
    let client = RoundFactoryClient::new(&env, &env.register(RoundFactory, ()));
    let caller = Address::generate(&env);
    let salt = BytesN::from_array(&env, &[1u8; 32]);

    assert_eq!(
        client.try_create_round(&caller, &params(&env, 0), &salt),
        Err(Ok(Error::NotInitialized.into()))
    );
}

#[test]
fn implementation_swap_is_admin_gated_and_prospective() {
    let (env, client, admin, _registry) = setup();
    let initial = BytesN::from_array(&env, &[0x11u8; 32]);
    let upgraded = BytesN::from_array(&env, &[0x33u8; 32]);

    assert_eq!(client.get_round_implementation(), initial);

    let stranger = Address::generate(&env);
    assert_eq!(
        client.try_update_round_contract(&stranger, &upgraded),
        Err(Ok(Error::NotAuthorized.into()))
    );
    assert_eq!(client.get_round_implementation(), initial);

    client.update_round_contract(&admin, &upgraded);
    assert_eq!(client.get_round_implementation(), upgraded);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("no events found");
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![&env, Symbol::new(&env, "impl_updated").into_val(&env)];
    assert_eq!(last_event.1, expected_topics);
    let data: ImplementationUpdated = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        ImplementationUpdated {
            old: initial,
            new: upgraded,
        }
    );
}

#[test]
fn program_validation_consults_the_registry() {
    let (env, client, admin, registry) = setup();
    let registry_client = ProgramRegistryClient::new(&env, &registry);

    let id = registry_client.create_program(
        &admin,
        &meta(&env, "ipfs://program"),
        &vec![&env, admin.clone()],
        &vec![&env],
    );
    assert!(registry_client.program_exists(&id));

    // The program reference resolves; creation proceeds past validation to
    // the deploy step (exercised end-to-end against uploaded WASM in
    // deployment environments, not here).
    assert_ne!(
        client.try_create_round(&admin, &params(&env, id), &BytesN::from_array(&env, &[2u8; 32])),
        Err(Ok(Error::ProgramNotFound.into()))
    );
}
