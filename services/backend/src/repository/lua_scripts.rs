//! Redis Lua scripts for atomic operations
//!
//! Contains Lua script constants used for the guards that must hold under
//! concurrent requests. Shared return convention: `1` applied, `0` guard
//! refused, `-1` gate closed, `-2` record missing.

/// Lua script to atomically debit a user balance
///
/// Keys: [user_key]
/// Args: [amount_cents]
///
/// Returns: new balance, or -1 on insufficient funds, -2 if the user is missing.
///
/// The balance check and decrement happen in one step, so concurrent debits
/// cannot take the balance below zero or lose updates.
pub const DEBIT_BALANCE_SCRIPT: &str = r#"
local user = KEYS[1]
local amount = tonumber(ARGV[1])

if redis.call('EXISTS', user) == 0 then
  return -2
end

local balance = tonumber(redis.call('HGET', user, 'balance') or '0')
if balance < amount then
  return -1
end

return redis.call('HINCRBY', user, 'balance', -amount)
"#;

/// Lua script for a once-only cashout claim, gated on round state
///
/// Keys: [bet_key]
/// Args: [multiplier_hundredths]
///
/// Returns: 1 claimed, 0 already cashed out, -1 round already finished,
/// -2 bet missing.
///
/// The round is looked up through the bet's own round_id so the cashed_out
/// flag and the finished gate are checked in a single atomic step.
pub const CASHOUT_BET_SCRIPT: &str = r#"
local bet = KEYS[1]
local multiplier = ARGV[1]

if redis.call('EXISTS', bet) == 0 then
  return -2
end

if redis.call('HGET', bet, 'cashed_out') == '1' then
  return 0
end

local round_id = redis.call('HGET', bet, 'round_id')
if round_id and redis.call('HGET', 'round:' .. round_id, 'finished') == '1' then
  return -1
end

redis.call('HSET', bet,
  'cashed_out', '1',
  'cashed_at_multiplier', multiplier
)
return 1
"#;

/// Lua script for a once-only round finish
///
/// Keys: [round_key]
/// Args: [crash_multiplier_hundredths]
///
/// Returns: 1 finished, 0 already finished, -2 round missing.
pub const FINISH_ROUND_SCRIPT: &str = r#"
local round = KEYS[1]

if redis.call('EXISTS', round) == 0 then
  return -2
end

if redis.call('HGET', round, 'finished') == '1' then
  return 0
end

redis.call('HSET', round,
  'finished', '1',
  'crash_multiplier', ARGV[1]
)
return 1
"#;

/// Lua script for a one-directional status transition
///
/// Keys: [record_key]
/// Args: [expected_status, new_status]
///
/// Returns: 1 transitioned, 0 status was not the expected one, -2 record
/// missing. Used for deposit approval and withdraw mark-paid.
pub const TRANSITION_STATUS_SCRIPT: &str = r#"
local record = KEYS[1]

if redis.call('EXISTS', record) == 0 then
  return -2
end

if redis.call('HGET', record, 'status') ~= ARGV[1] then
  return 0
end

redis.call('HSET', record, 'status', ARGV[2])
return 1
"#;
