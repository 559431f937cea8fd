//! Prompt templates for level generation, synthesis, and verification.
//!
//! Each builder fills one fixed template with the key-path context
//! accumulated so far. Generation templates ask for newline-delimited,
//! serial-numbered lists; the generator strips the numbering afterwards.

/// Components the background level asks for, one prompt per component.
pub const BACKGROUND_COMPONENTS: [&str; 3] = ["time and place", "time", "place"];

/// Ask for 10 backgrounds covering one component (time, place, or both).
pub fn background(theme: &str, component: &str) -> String {
    format!(
        "Tell me 10 backgrounds in {theme} themed novels and scripts.\n\n\
         Each background should only include {component} behind literary works and no any other extra narratives.\n\n\
         Each line starts with a serial number and a dot.\n"
    )
}

/// Ask for 3 protagonists.
pub fn protagonist(theme: &str, background: &str) -> String {
    format!(
        r#"The following is the theme and background of a novel or script:

### Theme
{theme}

### Background
{background}

Based on the theme and background mentioned above, tell me 3 possible protagonists.
The protagonist is the main character portrayed in the narratives about their growth.
Each protagonist should only include a brief characterization, without specific names.
"#
    )
}

/// Ask for 3 (protagonist, antagonist) pairs.
pub fn protagonist_antagonist(theme: &str, background: &str) -> String {
    format!(
        r#"The following is the theme and background of a novel or script:

### Theme
{theme}

### Background
{background}

Based on the theme and background mentioned above, tell me 3 possible (protagonist, antagonist) pairs.
The protagonist is the main character portrayed in the narratives about their growth.
The main role of the antagonist is to create a conflict event with the protagonist to prevent it from achieving its goal.
Each pair should be presented in the format: protagonist: <a brief characterization>; antagonist: <a brief characterization>.
Please remember to use protagonist and antagonist without specific names appearing.
"#
    )
}

/// Ask for 3 (protagonist, deuteragonist) pairs.
pub fn protagonist_deuteragonist(theme: &str, background: &str) -> String {
    format!(
        r#"The following is the theme and background of a novel or script:

### Theme
{theme}

### Background
{background}

Based on the theme and background mentioned above, tell me 3 possible (protagonist, deuteragonist) pairs.
The protagonist is the main character portrayed in the narratives about their growth.
The main role of the deuteragonist is to collaborate with the protagonist to achieve its goal.
Each pair should be presented in the format: protagonist: <a brief characterization>; deuteragonist: <a brief characterization>.
Please remember to use protagonist and deuteragonist without specific names appearing.
"#
    )
}

/// Ask for two independent main events.
pub fn event(theme: &str, background: &str, persona: &str) -> String {
    format!(
        r#"The following is the theme, background and persona of a novel or script:

### Theme
{theme}

### Background
{background}

### Persona
{persona}

Based on the theme, background and persona mentioned above, conceive two independent events that could run through the entire narrative context.
Please use a concise and coherent sentence to describe the entire event.
"#
    )
}

/// Ask for one concrete ending.
pub fn ending(theme: &str, background: &str, persona: &str, event: &str) -> String {
    format!(
        r#"The following is the theme, background, persona and main event of a novel or script:

### Theme
{theme}

### Background
{background}

### Persona
{persona}

## Event
{event}

Based on the theme, background, persona and event mentioned above, conceive a concretized ending.
Please use a concise and coherent sentence to describe the ending.
"#
    )
}

/// Ask for one twist hooking the event to the ending.
pub fn twist(theme: &str, background: &str, persona: &str, event: &str, ending: &str) -> String {
    format!(
        r#"The following is the theme, background, persona, main event and ending of a novel or script:

### Theme
{theme}

### Background
{background}

### Persona
{persona}

## Event
{event}

## Ending
{ending}

Based on the theme, background, persona, event and ending mentioned above, conceive a twist as an unique hook to connect the main event and ending.
Please use a concise and coherent sentence to describe the twist.
"#
    )
}

/// Combine all six elements into one premise sentence.
pub fn synthesize(
    theme: &str,
    background: &str,
    persona: &str,
    event: &str,
    ending: &str,
    twist: &str,
) -> String {
    format!(
        r#"The following is the theme, background, persona, main event, final ending and twist of a novel or script:

### Theme
{theme}

### Background
{background}

### Persona
{persona}

## Event
{event}

## Ending
{ending}

## Twist
{twist}

Please combine the aforementioned elements of a novel or script into one compact, concise, and coherent sentence as a story premise.
"#
    )
}

/// Ask for a `[[Yes]]`/`[[No]]` consistency judgment on a premise.
pub fn verify(premise: &str) -> String {
    format!(
        r#"Here is a story premise:

{premise}

Please help to verify:

1. Does it contain obvious inconsistencies. For example, the background, plot, and characters do not match

2. Does it contain obvious factual errors. For example, there were obvious historical errors and time span errors

If there are any errors mentioned above, please return Yes wrapped by `[[]]`, otherwise return No wrapped by `[[]]` without any other extra output.
"#
    )
}
