//! Package templates seeded into the `packages` collection.

use std::collections::BTreeMap;

use crate::models::PackageFields;

struct Template {
    name: &'static str,
    destination: &'static str,
    duration: &'static str,
    days: &'static [&'static str],
}

const TEMPLATES: &[Template] = &[
    Template {
        name: "Kashmir Package",
        destination: "Srinagar - Sonamarg - Pahalgam - Gulmarg",
        duration: "5 nights and 6 days",
        days: &[
            "Pickup from Srinagar airport, Check-in hotel, freshen up and embark on a short trek to the Shankaracharya Hill. Afterwards, enjoy a picturesque Shikara ride on the famous Dal Lake and visit the Char Chinar Island. Continue the day with a thrilling speed boat ride on the lake, followed by a nature and photography tour at the lush Kashmiri gardens of Shalimar and Nishat Bagh. End the day with a night's stay in Srinagar.",
            "After breakfast, head to Sonamarg, known as the 'Meadow of Gold' for its vibrant flower valleys and serene lakes. Spend the day exploring tourist attractions such as the Baltal Valley, Satsar Lake, Thajiwas Glacier, Zoji-La Pass, Yusmarg, and Nilagrad River. After a refreshing day in the heart of the Himalayas, return to Srinagar for a night's stay.",
            "After breakfast, visit the picturesque destination of Gulmarg, known as the 'Meadow of Flowers'. Take the famous Gondola ride, which is one of the highest in the world, to the second phase Apharwat point. Enjoy playing in the snow and participate in skiing and snowboarding activities. End the day with a night's stay in a houseboat in Srinagar.",
            "After breakfast, depart for Pahalgam and stop to admire the saffron fields at Pampore. Take a photo opportunity at the apple valley and walnut plantations along the way. Upon arrival in Pahalgam, take a walking tour and take photos in the beautiful Aru valley. Stay the night in Pahalgam.",
            "After breakfast, head back to Srinagar, with a visit to the Avantipur ruins and a Kashmiri cricket bat factory along the way. Enjoy a free day in Srinagar and stay the night there.",
            "After breakfast, Srinagar airport drop",
        ],
    },
    Template {
        name: "Kerala Package",
        destination: "Cochin - Munnar - Thekkady - Alleppey",
        duration: "5 nights and 6 days",
        days: &[
            "Pickup from Cochin railway station/airport check in hotel, after fresh up visit Marine Drive, Museum, LuLu Mall and night stay Cochin.",
            "After breakfast proceed to Munnar visit Rose Garden, Tea Garden, Elephant Park, Matupetty Dam, and Jeep Safari (Optional) night stay at Munnar.",
            "After breakfast Kallar Waterfall, Spice Garden, Chenkulam Dam, Wonder-Valley/Dream-Land Fun park (Optional), Hydel Park and night stay at Munnar.",
            "After breakfast proceed to Thekkady visit Boating at Periyar Wild life sanctuary , Spice Plantation shopping, Elephant Ride night stay at Thekkady.",
            "After breakfast proceed to Alleppey visit, Alleppey town beach, Shikhara Boating and Night stay at Alleppey Hotel.",
            "Kochi Railway Station/ Airport Drop.",
        ],
    },
    Template {
        name: "Shimla Manali",
        destination: "Delhi - Shimla - Manali - Delhi",
        duration: "5 nights and 6 days",
        days: &[
            "Pick up from Delhi/Chandigarh airport/railway station to Shimla and night stay at Shimla.",
            "Shimla, after breakfast full-day excursion to Kufri (one of the finest ski slopes), Mall Road, and other sightseeing, then a night stay at Shimla.",
            "After breakfast depart to Manali, on arrival check-in hotel, overnight stay at Manali.",
            "Full-day excursion to Rohtag pass, the gateway to Lahoul valley, Rahala falls, Solang valley, and Manali Mall Road. Overnight stay at Manali.",
            "Manali half-day sightseeing and proceed to Delhi/Chandigarh night stay.",
            "Delhi/Chandigarh airport/railway station drop.",
        ],
    },
    Template {
        name: "Ooty Coorg Honeymoon Package",
        destination: "Ooty - Coorg",
        duration: "4 nights and 5 days",
        days: &[
            "Pickup from Mysore railway station, proceed to coorg and night stay at Coorg.",
            "Coorg sightseeing visit abbey falls, raja seat, Dubre Elephant camp, etc and night stay at Coorg.",
            "Coorg to Ooty sightseeing, visit botanical garden, rose garden, Ooty lake and night stay at ooty.",
            "Coonur sightseeing visit Sim's Park, Dolphin's Nose, Lamb's Rock, etc and night stay at Mysore.",
            "Mysore railway station drop.",
        ],
    },
    Template {
        name: "Goa Package",
        destination: "Goa",
        duration: "2 nights and 3 days",
        days: &[
            "Pick up from Hubli/Thivim railway station & proceed to Goa, check in to the hotel, after fresh-up visit north Goa Mayem Lake, Mapusa Town, Anjuna, Calangute night stay at Goa.",
            "After breakfast in the hotel, proceed for south Goa sightseeing covering old Goa church, Dona Paula, Miramar Beach, Colva beach, Panjim Shopping, and overnight stay at a hotel in Goa.",
            "After breakfast proceeds to shopping & Hubli/Thivim railway station drop.",
        ],
    },
    Template {
        name: "Golden Triangle",
        destination: "Delhi - Agra - Jaipur - Ajmer",
        duration: "5 nights and 6 days",
        days: &[
            "Pickup from Agra railway station, check-in at the hotel, after fresh-up, visit Taj mahal, Agra fort, and night stay at Agra.",
            "After breakfast, proceed to Jaipur, visit Hawa mahal, city palace, museum, Jantar-mantar, Amber fort and night stay at Jaipur.",
            "After breakfast proceeds to Ajmer sharif, ziyarat of dargah sharif and night stay at Ajmer sharif.",
            "After breakfast, Sightseeing on own and night's stay at Ajmer sharif.",
            "Early morning proceed to Delhi by train from Ajmer sharif, pickup from Delhi railways station at 12:00 noon, check-in hotel, free time for shopping at evening by self, and night stay at Delhi.",
            "Delhi airport/railway station drop.",
        ],
    },
    Template {
        name: "Temple Cities",
        destination: "Madurai - Rameshwaram - Kanyakumari - Kodaikanal",
        duration: "3 nights and 4 days",
        days: &[
            "Pick up from Madurai railway station, Check in hotel, night stay at Madurai.",
            "Madurai Meenakshi temple darshan and proceed to Rameshwaram, visit pambam bridge, Ramnath swami temple, 22 well bath, sea bath, Sita tirth, Laxman tirth, floating stone and proceed to Kanyakumari night stay.",
            "Kanyakumari sightseeing: visit sunrise point, Swami Vivekanad memorial rock, Thiruvalluvar statue, Suchindrum temple, Triveni sangam & proceed to Madurai night stay.",
            "Madurai to Kodaikanal sightseeing, visit coakers walk, pillar walk, Green valley view, silver cascade waterfalls & back Madurai drop.",
        ],
    },
    Template {
        name: "Dandeli Package",
        destination: "Dandeli",
        duration: "1 night and 2 days",
        days: &[
            "Pickup from Hubli, proceed to Dandeli. Check-in resort. Visit Dandeli wildlife sanctuary, river rafting. Night stay at Dandeli.",
            "Morning nature walk, Syntheri Rocks visit, and Hubli drop.",
        ],
    },
    Template {
        name: "Mahabaleshwar Package",
        destination: "Mahabaleshwar - Lonavala",
        duration: "2 nights and 3 days",
        days: &[
            "Pickup from Pune railway station/airport, proceed to Mahabaleshwar. Visit viewpoints and night stay.",
            "Mahabaleshwar sightseeing - Venna Lake, Mapro Garden, Elephant's Head Point, and night stay.",
            "Proceed to Lonavala, visit Bhushi Dam, Tiger Point, and Pune drop.",
        ],
    },
];

/// The fixed catalog, in insertion order. Itinerary keys are `day_1..day_N`.
pub fn package_templates() -> Vec<PackageFields> {
    TEMPLATES
        .iter()
        .map(|t| PackageFields {
            package_name: t.name.to_string(),
            destination: t.destination.to_string(),
            duration: t.duration.to_string(),
            itinerary: t
                .days
                .iter()
                .enumerate()
                .map(|(i, text)| (format!("day_{}", i + 1), text.to_string()))
                .collect::<BTreeMap<_, _>>(),
        })
        .collect()
}
